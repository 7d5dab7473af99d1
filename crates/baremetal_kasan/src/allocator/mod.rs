//! # allocator
//! The allocator is split into a frontend and a backend. The backend is the
//! platform heap, it knows nothing about sanitization. The frontend wraps each
//! allocation in red-zones and keeps the shadow map up to date as blocks are
//! allocated, resized and freed.
pub mod backend;
pub mod frontend;
