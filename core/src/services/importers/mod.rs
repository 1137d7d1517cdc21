pub mod lynx;
