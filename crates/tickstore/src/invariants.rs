//! Debug-only assertion macros for the ring and buffer invariants documented
//! alongside each type. Compiled out entirely in release builds.

/// INV-RING-01: occupancy never exceeds capacity.
macro_rules! debug_assert_ring_occupancy {
    ($writer:expr, $reader:expr, $capacity:expr) => {
        #[cfg(debug_assertions)]
        {
            let occ = $writer.wrapping_sub($reader);
            debug_assert!(
                occ <= $capacity as u64,
                "ring occupancy {} exceeds capacity {}",
                occ,
                $capacity
            );
        }
    };
}

/// INV-RING-02: reader cursor never passes writer cursor.
macro_rules! debug_assert_reader_not_past_writer {
    ($writer:expr, $reader:expr) => {
        #[cfg(debug_assertions)]
        {
            debug_assert!(
                $writer.wrapping_sub($reader) as i64 >= 0,
                "reader cursor {} passed writer cursor {}",
                $reader,
                $writer
            );
        }
    };
}

/// INV-BUF-01: all six columns of a columnar buffer stay the same length.
macro_rules! debug_assert_columns_aligned {
    ($buf:expr) => {
        #[cfg(debug_assertions)]
        {
            let n = $buf.timestamps.len();
            debug_assert_eq!(n, $buf.symbol_ids.len());
            debug_assert_eq!(n, $buf.exchange_ids.len());
            debug_assert_eq!(n, $buf.prices.len());
            debug_assert_eq!(n, $buf.volumes.len());
            debug_assert_eq!(n, $buf.trade_conditions.len());
        }
    };
}

/// INV-ACTIVE-01: active buffer's commit count never exceeds its reserved capacity.
macro_rules! debug_assert_active_buffer_bounded {
    ($committed:expr, $capacity:expr) => {
        #[cfg(debug_assertions)]
        {
            debug_assert!(
                $committed < $capacity,
                "active buffer commit count {} at or past capacity {}",
                $committed,
                $capacity
            );
        }
    };
}

/// INV-CHAIN-01: sealed chain never exceeds its configured bound.
macro_rules! debug_assert_chain_bounded {
    ($chain:expr, $max:expr) => {
        #[cfg(debug_assertions)]
        {
            debug_assert!(
                $chain.len() <= $max,
                "sealed chain length {} exceeds bound {}",
                $chain.len(),
                $max
            );
        }
    };
}

pub(crate) use debug_assert_active_buffer_bounded;
pub(crate) use debug_assert_chain_bounded;
pub(crate) use debug_assert_columns_aligned;
pub(crate) use debug_assert_reader_not_past_writer;
pub(crate) use debug_assert_ring_occupancy;
