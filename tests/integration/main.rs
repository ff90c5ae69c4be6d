// Each file in the tests directory is its own crate; this one needs a broker.
//
// Run with a local RabbitMQ on the default port:
//   cargo test --test integration -- --ignored

mod broker_test;
