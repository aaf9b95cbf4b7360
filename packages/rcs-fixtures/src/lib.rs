//! Sample schemas compiled at build time.
//!
//! Each module holds the code generated from `schemas/<name>.schema`.

pub mod mesh {
    include!(concat!(env!("OUT_DIR"), "/mesh.rs"));
}

pub mod primitives {
    include!(concat!(env!("OUT_DIR"), "/primitives.rs"));
}

pub mod scene {
    include!(concat!(env!("OUT_DIR"), "/scene.rs"));
}

pub mod shadowing {
    include!(concat!(env!("OUT_DIR"), "/shadowing.rs"));
}
