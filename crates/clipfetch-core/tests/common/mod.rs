pub mod helix_server;
