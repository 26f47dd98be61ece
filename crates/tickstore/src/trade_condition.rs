//! Trade-condition tag for a [`crate::Tick`].
//!
//! The numeric codes are not contractual per the external wire format, but are
//! chosen to match a real-world precedent rather than invented arbitrarily.

/// Closed 8-bit enumeration of trade condition tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TradeCondition {
    None = 0,
    RegularSale = 1,
    Acquisition = 2,
    AveragePriceTrade = 3,
    AutomaticExecution = 4,
    BunchedTrade = 5,
    BunchedSoldTrade = 6,
    CashSale = 7,
    ClosingPrints = 8,
    CrossTrade = 9,
    DerivativelyPriced = 10,
    Distribution = 11,
    NextDay = 12,
    Seller = 13,
    PriorReferencePrice = 14,
    IntradayDetail = 15,
    ContingentTrade = 16,
    OddLotTrade = 17,
    StoppedStock = 18,
    VolumeWeightedAverage = 19,
    IntermarketSweep = 20,
    FormT = 21,
    OpeningPrints = 22,
    OutOfSequence = 23,
    SoldLast = 24,
    MarketCenterOfficialClose = 25,
    MarketCenterOfficialOpen = 26,
    CorrectedConsolidatedClose = 27,
    Cancelled = 28,
}

impl Default for TradeCondition {
    fn default() -> Self {
        TradeCondition::None
    }
}

impl TradeCondition {
    /// Reconstructs a tag from its wire byte. Unknown codes fall back to `None`
    /// rather than failing — the wire format carries no versioning (see external
    /// interfaces).
    pub fn from_u8(code: u8) -> Self {
        match code {
            1 => TradeCondition::RegularSale,
            2 => TradeCondition::Acquisition,
            3 => TradeCondition::AveragePriceTrade,
            4 => TradeCondition::AutomaticExecution,
            5 => TradeCondition::BunchedTrade,
            6 => TradeCondition::BunchedSoldTrade,
            7 => TradeCondition::CashSale,
            8 => TradeCondition::ClosingPrints,
            9 => TradeCondition::CrossTrade,
            10 => TradeCondition::DerivativelyPriced,
            11 => TradeCondition::Distribution,
            12 => TradeCondition::NextDay,
            13 => TradeCondition::Seller,
            14 => TradeCondition::PriorReferencePrice,
            15 => TradeCondition::IntradayDetail,
            16 => TradeCondition::ContingentTrade,
            17 => TradeCondition::OddLotTrade,
            18 => TradeCondition::StoppedStock,
            19 => TradeCondition::VolumeWeightedAverage,
            20 => TradeCondition::IntermarketSweep,
            21 => TradeCondition::FormT,
            22 => TradeCondition::OpeningPrints,
            23 => TradeCondition::OutOfSequence,
            24 => TradeCondition::SoldLast,
            25 => TradeCondition::MarketCenterOfficialClose,
            26 => TradeCondition::MarketCenterOfficialOpen,
            27 => TradeCondition::CorrectedConsolidatedClose,
            28 => TradeCondition::Cancelled,
            _ => TradeCondition::None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_codes() {
        for code in 0u8..=28 {
            let tc = TradeCondition::from_u8(code);
            assert_eq!(tc.as_u8(), code);
        }
    }

    #[test]
    fn unknown_code_falls_back_to_none() {
        assert_eq!(TradeCondition::from_u8(200), TradeCondition::None);
    }
}
