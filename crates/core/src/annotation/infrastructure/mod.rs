pub mod service_worker;
