pub mod loop_params;
pub mod pid_config;
