pub(crate) mod cache;
pub(crate) mod decode;
pub(crate) mod path;
pub(crate) mod source;
