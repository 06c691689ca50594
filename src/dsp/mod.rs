pub mod fft;
pub mod window;
