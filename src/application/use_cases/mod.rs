pub mod plan_provisioner;
pub mod subscription_billing;
