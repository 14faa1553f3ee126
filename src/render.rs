pub(crate) mod animation;
pub(crate) mod blend;
pub(crate) mod compositor;
pub(crate) mod surface;
