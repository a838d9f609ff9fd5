#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use neptune_cache::MemcachedDriver;
use neptune_sql_core::DriverConfig;

/// In-process memcached stand-in speaking the text protocol on 127.0.0.1.
///
/// Expiration times are accepted and ignored.
pub struct FakeMemcached {
    pub port: u16,
    commands: Arc<Mutex<Vec<String>>>,
}

impl FakeMemcached {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind fake server");
        let port = listener.local_addr().expect("No local address").port();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let store = Arc::new(Mutex::new(HashMap::<String, Vec<u8>>::new()));

        let log = Arc::clone(&commands);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let log = Arc::clone(&log);
                let store = Arc::clone(&store);
                thread::spawn(move || serve(stream, &log, &store));
            }
        });

        Self { port, commands }
    }

    /// Command lines received so far, without data blocks.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn config(&self, prefix: &str) -> DriverConfig {
        DriverConfig::new()
            .with("host", "127.0.0.1")
            .with("port", self.port)
            .with("prefix", prefix)
    }

    pub fn driver(&self, prefix: &str) -> MemcachedDriver {
        MemcachedDriver::new(&self.config(prefix)).expect("Failed to build memcached driver")
    }
}

fn serve(stream: TcpStream, log: &Mutex<Vec<String>>, store: &Mutex<HashMap<String, Vec<u8>>>) {
    let mut writer = stream.try_clone().expect("Failed to clone stream");
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let command = line.trim_end().to_string();
        log.lock().unwrap().push(command.clone());
        let parts: Vec<&str> = command.split(' ').collect();

        let reply: Vec<u8> = match parts.as_slice() {
            [verb @ ("set" | "add"), key, _flags, _exptime, len] => {
                let len: usize = len.parse().unwrap();
                let mut data = vec![0; len + 2];
                if reader.read_exact(&mut data).is_err() {
                    return;
                }
                data.truncate(len);
                let mut store = store.lock().unwrap();
                if *verb == "add" && store.contains_key(*key) {
                    b"NOT_STORED\r\n".to_vec()
                } else {
                    store.insert((*key).to_string(), data);
                    b"STORED\r\n".to_vec()
                }
            }
            ["get", key] => {
                let mut reply = Vec::new();
                if let Some(data) = store.lock().unwrap().get(*key) {
                    reply.extend_from_slice(format!("VALUE {key} 0 {}\r\n", data.len()).as_bytes());
                    reply.extend_from_slice(data);
                    reply.extend_from_slice(b"\r\n");
                }
                reply.extend_from_slice(b"END\r\n");
                reply
            }
            ["delete", key] => {
                if store.lock().unwrap().remove(*key).is_some() {
                    b"DELETED\r\n".to_vec()
                } else {
                    b"NOT_FOUND\r\n".to_vec()
                }
            }
            ["flush_all"] | ["flush_all", _] => {
                store.lock().unwrap().clear();
                b"OK\r\n".to_vec()
            }
            ["quit"] => return,
            _ => b"ERROR\r\n".to_vec(),
        };

        if writer.write_all(&reply).is_err() {
            return;
        }
    }
}

/// A port nothing listens on.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.local_addr().expect("No local address").port()
}
