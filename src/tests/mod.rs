mod cdx;
mod fields;
mod stream;
