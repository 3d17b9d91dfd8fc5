pub mod sproutvideo;
