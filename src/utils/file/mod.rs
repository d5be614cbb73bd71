pub mod convert;
pub mod google_cloud_file_storage;
pub mod local_file_storage;
