pub mod braineac;
pub mod downloads;
pub mod gtex;
pub mod http_client;
pub mod ldlink;
pub mod portal_service;
