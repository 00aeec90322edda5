use super::{Client, Consumer, Transport};
use crate::resource::Kind;
use std::collections::HashMap;

/// Clients for every configured sibling service, by kind.
#[derive(Debug, Clone, Default)]
pub struct Consumers {
    clients: HashMap<Kind, Client>,
}

impl Consumers {
    pub fn new(consumers: &HashMap<String, Consumer>, transport: &Transport) -> Self {
        let clients = consumers
            .iter()
            .map(|(key, consumer)| {
                let mut consumer = consumer.clone();
                if consumer.kind.is_empty() {
                    consumer.kind = key.clone();
                }
                (Kind::new(key.clone()), Client::new(consumer, transport.clone()))
            })
            .collect();
        Self { clients }
    }

    pub fn client(&self, kind: &str) -> Option<&Client> {
        self.clients.get(kind)
    }

    /// Whether endpoints of `kind` accept client credentials in place of a token.
    pub fn is_public(&self, kind: &str) -> bool {
        self.client(kind)
            .map(|client| client.consumer().public)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;

    #[test]
    fn test_lookup_and_public_flag() {
        let mut map = HashMap::new();
        map.insert(
            "token".to_string(),
            Consumer {
                target: "http://token".to_string(),
                public: true,
                ..Consumer::default()
            },
        );
        map.insert(
            "entity".to_string(),
            Consumer {
                target: "http://entity".to_string(),
                ..Consumer::default()
            },
        );
        let transport = Transport::new(&TransportConfig::default()).unwrap();
        let consumers = Consumers::new(&map, &transport);

        assert_eq!(consumers.len(), 2);
        assert!(consumers.is_public("token"));
        assert!(!consumers.is_public("entity"));
        assert!(!consumers.is_public("label"));
        assert_eq!(consumers.client("token").unwrap().consumer().kind, "token");
    }
}
