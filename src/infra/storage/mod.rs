//! Blob storage and upload token signing.

pub mod local;
pub mod token;

pub use local::LocalBlobStore;
pub use token::UploadTokenSigner;
