pub mod cert_utils;
pub mod types;

// 重新导出常用类型和函数
pub use cert_utils::{
    encode_pem, export_certificate, import_certificate, import_pem_bundle, load_certificate_file,
    write_pem_file,
};
pub use types::{Certificate, CertificateInfo};
