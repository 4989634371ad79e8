//! Configuration surface consumed by the encoding and decoding containers.
use crate::key::{KeyDecodingStrategy, KeyEncodingStrategy};
use crate::placement::{NodeDecodingStrategy, NodeEncodingStrategy};

#[derive(Debug, Clone, Default)]
pub struct EncoderOptions {
    pub key_encoding: KeyEncodingStrategy,
    pub node_encoding: NodeEncodingStrategy,
}

#[derive(Debug, Clone, Default)]
pub struct DecoderOptions {
    pub key_decoding: KeyDecodingStrategy,
    pub node_decoding: NodeDecodingStrategy,
}

impl EncoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_encoding(mut self, strategy: KeyEncodingStrategy) -> Self {
        self.key_encoding = strategy;
        self
    }

    pub fn node_encoding(mut self, strategy: NodeEncodingStrategy) -> Self {
        self.node_encoding = strategy;
        self
    }
}

impl DecoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_decoding(mut self, strategy: KeyDecodingStrategy) -> Self {
        self.key_decoding = strategy;
        self
    }

    pub fn node_decoding(mut self, strategy: NodeDecodingStrategy) -> Self {
        self.node_decoding = strategy;
        self
    }
}
