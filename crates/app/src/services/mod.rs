pub mod refresh_service;
