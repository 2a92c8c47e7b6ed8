//! Application services implementing ports in terms of other ports

mod gateway_llm_service;

pub use gateway_llm_service::GatewayLlmService;
