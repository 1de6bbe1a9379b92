pub mod billing_provider;
