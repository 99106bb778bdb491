use couchdb_rs::{Client, ClientConfig};
use mockito::ServerGuard;

/// Config pointing at the mock server, basic auth.
pub fn config_for(server: &ServerGuard) -> ClientConfig {
    let host_with_port = server.host_with_port();
    let (host, port) = host_with_port.rsplit_once(':').expect("host:port");
    ClientConfig::new(host, port.parse().expect("port"), "user", "pass")
}

#[allow(dead_code)]
pub async fn connect(server: &ServerGuard) -> Client {
    Client::connect(config_for(server))
        .await
        .expect("client connects")
}
