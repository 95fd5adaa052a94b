// Poster and video rendering

pub mod compositor;
pub mod infographic;
pub mod layout;
pub mod video;
