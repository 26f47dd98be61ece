//! The record type the whole store moves: a plain, `Copy` value with a fixed
//! byte layout suitable for mem-copy serialization.

use crate::trade_condition::TradeCondition;

/// Byte size of the wire layout: timestamp(8) + symbol_id(4) + exchange_id(4) +
/// price(8) + volume(4) + trade_condition(1).
pub const SERIALIZED_SIZE: usize = 8 + 4 + 4 + 8 + 4 + 1;

const PRICE_EPSILON: f64 = 1e-9;

/// A single trade record.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Tick {
    pub timestamp: u64,
    pub symbol_id: u32,
    pub exchange_id: u32,
    pub price: f64,
    pub volume: u32,
    pub trade_condition: TradeCondition,
}

impl Tick {
    pub fn new(
        timestamp: u64,
        symbol_id: u32,
        exchange_id: u32,
        price: f64,
        volume: u32,
        trade_condition: TradeCondition,
    ) -> Self {
        Self {
            timestamp,
            symbol_id,
            exchange_id,
            price,
            volume,
            trade_condition,
        }
    }

    /// Mem-copies this record into `buf`, host byte order.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`SERIALIZED_SIZE`].
    pub fn serialize(&self, buf: &mut [u8]) {
        assert!(buf.len() >= SERIALIZED_SIZE, "buffer too small for Tick");
        let mut off = 0;
        buf[off..off + 8].copy_from_slice(&self.timestamp.to_ne_bytes());
        off += 8;
        buf[off..off + 4].copy_from_slice(&self.symbol_id.to_ne_bytes());
        off += 4;
        buf[off..off + 4].copy_from_slice(&self.exchange_id.to_ne_bytes());
        off += 4;
        buf[off..off + 8].copy_from_slice(&self.price.to_ne_bytes());
        off += 8;
        buf[off..off + 4].copy_from_slice(&self.volume.to_ne_bytes());
        off += 4;
        buf[off] = self.trade_condition.as_u8();
    }

    /// Reconstructs a record mem-copied via [`Tick::serialize`].
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`SERIALIZED_SIZE`].
    pub fn deserialize(buf: &[u8]) -> Self {
        assert!(buf.len() >= SERIALIZED_SIZE, "buffer too small for Tick");
        let mut off = 0;
        let timestamp = u64::from_ne_bytes(buf[off..off + 8].try_into().unwrap());
        off += 8;
        let symbol_id = u32::from_ne_bytes(buf[off..off + 4].try_into().unwrap());
        off += 4;
        let exchange_id = u32::from_ne_bytes(buf[off..off + 4].try_into().unwrap());
        off += 4;
        let price = f64::from_ne_bytes(buf[off..off + 8].try_into().unwrap());
        off += 8;
        let volume = u32::from_ne_bytes(buf[off..off + 4].try_into().unwrap());
        off += 4;
        let trade_condition = TradeCondition::from_u8(buf[off]);
        Self {
            timestamp,
            symbol_id,
            exchange_id,
            price,
            volume,
            trade_condition,
        }
    }
}

impl Default for Tick {
    fn default() -> Self {
        Self {
            timestamp: 0,
            symbol_id: 0,
            exchange_id: 0,
            price: 0.0,
            volume: 0,
            trade_condition: TradeCondition::None,
        }
    }
}

impl PartialEq for Tick {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp
            && self.symbol_id == other.symbol_id
            && self.exchange_id == other.exchange_id
            && (self.price - other.price).abs() < PRICE_EPSILON
            && self.volume == other.volume
            && self.trade_condition == other.trade_condition
    }
}
