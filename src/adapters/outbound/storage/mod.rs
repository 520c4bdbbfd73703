/// Storage adapters implementing the graph store port
mod in_memory_graph_store;

pub use in_memory_graph_store::InMemoryGraphStore;
