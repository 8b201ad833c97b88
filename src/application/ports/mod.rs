pub mod subscription_provider;
