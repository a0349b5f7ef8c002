pub mod graphql;
pub mod id_counter;
pub mod jsonrpc;
pub mod trpc;
