//! Called/calling party addresses (ITU-T Q.713 §3.4)
//!
//! ```text
//!  bit   8        7         6 5 4 3     2     1
//!      national routing     GTI        SSN    PC
//!      use      indicator              ind.   ind.
//! ```
//!
//! The indicator octet is followed by the point code (14 bits, LSB first),
//! the subsystem number and the global title, each only when announced.

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::bcd::{digits_to_swapped_bytes, DEFAULT_FILLER};
use crate::error::Error;
use crate::Result;

const IND_POINT_CODE: u8 = 0x01;
const IND_SSN: u8 = 0x02;
const IND_ROUTE_ON_SSN: u8 = 0x40;
const IND_NATIONAL: u8 = 0x80;

/// Largest ITU point code
pub const MAX_POINT_CODE: u16 = 0x3FFF;

/// BCD, odd number of digits
pub const ENCODING_SCHEME_BCD_ODD: u8 = 1;
/// BCD, even number of digits
pub const ENCODING_SCHEME_BCD_EVEN: u8 = 2;

/// E.164 numbering plan
pub const NUMBERING_PLAN_E164: u8 = 1;
/// International number
pub const NAI_INTERNATIONAL: u8 = 4;

/// Pick the BCD encoding scheme for a digit string
pub fn encoding_scheme_for(digits: &str) -> u8 {
    if digits.chars().count() % 2 == 1 {
        ENCODING_SCHEME_BCD_ODD
    } else {
        ENCODING_SCHEME_BCD_EVEN
    }
}

/// Whether routing uses the global title or the point code + SSN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingIndicator {
    #[default]
    RouteOnGt,
    RouteOnSsn,
}

/// Global title variants by global title indicator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalTitle {
    /// GTI 1: nature of address only
    NatureOfAddress { nai: u8, digits: String },
    /// GTI 2: translation type only
    TranslationType { tt: u8, digits: String },
    /// GTI 3: translation type, numbering plan and encoding scheme
    TranslationNumbering { tt: u8, np: u8, es: u8, digits: String },
    /// GTI 4: translation type, numbering plan, encoding scheme and nature of address
    Full {
        tt: u8,
        np: u8,
        es: u8,
        nai: u8,
        digits: String,
    },
}

impl GlobalTitle {
    /// International E.164 number, translation type 0
    pub fn e164(digits: impl Into<String>) -> Self {
        let digits = digits.into();
        GlobalTitle::Full {
            tt: 0,
            np: NUMBERING_PLAN_E164,
            es: encoding_scheme_for(&digits),
            nai: NAI_INTERNATIONAL,
            digits,
        }
    }

    /// Global title indicator value
    pub fn indicator(&self) -> u8 {
        match self {
            GlobalTitle::NatureOfAddress { .. } => 1,
            GlobalTitle::TranslationType { .. } => 2,
            GlobalTitle::TranslationNumbering { .. } => 3,
            GlobalTitle::Full { .. } => 4,
        }
    }

    pub fn digits(&self) -> &str {
        match self {
            GlobalTitle::NatureOfAddress { digits, .. }
            | GlobalTitle::TranslationType { digits, .. }
            | GlobalTitle::TranslationNumbering { digits, .. }
            | GlobalTitle::Full { digits, .. } => digits,
        }
    }

    fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        let digits = self.digits();
        match self {
            GlobalTitle::NatureOfAddress { nai, .. } => {
                check_field("nature of address", *nai, 0x7F)?;
                let odd = if digits.len() % 2 == 1 { 0x80 } else { 0x00 };
                buf.put_u8(odd | (*nai & 0x7F));
            }
            GlobalTitle::TranslationType { tt, .. } => {
                // no odd/even flag, the filler nibble would be ambiguous
                let count = digits.chars().count();
                if count % 2 == 1 {
                    return Err(Error::OddDigitCount { gti: 2, digits: count });
                }
                buf.put_u8(*tt);
            }
            GlobalTitle::TranslationNumbering { tt, np, es, .. } => {
                check_field("numbering plan", *np, 0x0F)?;
                check_encoding_scheme(*es, digits)?;
                buf.put_u8(*tt);
                buf.put_u8((*np << 4) | (*es & 0x0F));
            }
            GlobalTitle::Full { tt, np, es, nai, .. } => {
                check_field("numbering plan", *np, 0x0F)?;
                check_field("nature of address", *nai, 0x7F)?;
                check_encoding_scheme(*es, digits)?;
                buf.put_u8(*tt);
                buf.put_u8((*np << 4) | (*es & 0x0F));
                buf.put_u8(*nai & 0x7F);
            }
        }
        buf.put_slice(&digits_to_swapped_bytes(digits, DEFAULT_FILLER)?);
        Ok(())
    }
}

fn check_encoding_scheme(es: u8, digits: &str) -> Result<()> {
    let count = digits.chars().count();
    let mismatch = match es {
        ENCODING_SCHEME_BCD_ODD => count % 2 == 0,
        ENCODING_SCHEME_BCD_EVEN => count % 2 == 1,
        // digits are always packed as BCD
        _ => true,
    };
    if mismatch {
        return Err(Error::EncodingSchemeMismatch { scheme: es, digits: count });
    }
    Ok(())
}

fn check_field(field: &'static str, value: u8, max: u8) -> Result<()> {
    if value > max {
        return Err(Error::FieldOutOfRange { field, value, max });
    }
    Ok(())
}

/// SCCP party address
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutingAddress {
    pub routing_indicator: RoutingIndicator,
    pub national: bool,
    pub point_code: Option<u16>,
    pub subsystem_number: Option<u8>,
    pub global_title: Option<GlobalTitle>,
}

impl RoutingAddress {
    /// Address routed on global title with a subsystem number
    pub fn global_title(ssn: u8, global_title: GlobalTitle) -> Self {
        Self {
            subsystem_number: Some(ssn),
            global_title: Some(global_title),
            ..Default::default()
        }
    }

    /// Address routed on point code and subsystem number
    pub fn point_code_ssn(point_code: u16, ssn: u8) -> Self {
        Self {
            routing_indicator: RoutingIndicator::RouteOnSsn,
            point_code: Some(point_code),
            subsystem_number: Some(ssn),
            ..Default::default()
        }
    }

    /// Build an address from a raw address indicator octet
    ///
    /// The indicator decides which of the remaining fields are used; fields
    /// it does not announce are ignored. `0x12`, for example, announces an
    /// SSN and a GTI 4 global title routed on GT.
    pub fn from_indicator(
        indicator: u8,
        point_code: u16,
        ssn: u8,
        tt: u8,
        np: u8,
        es: u8,
        nai: u8,
        digits: &str,
    ) -> Result<Self> {
        let digits = digits.to_string();
        let global_title = match (indicator >> 2) & 0x0F {
            0 => None,
            1 => Some(GlobalTitle::NatureOfAddress { nai, digits }),
            2 => Some(GlobalTitle::TranslationType { tt, digits }),
            3 => Some(GlobalTitle::TranslationNumbering { tt, np, es, digits }),
            4 => Some(GlobalTitle::Full {
                tt,
                np,
                es,
                nai,
                digits,
            }),
            other => return Err(Error::UnsupportedGlobalTitleIndicator(other)),
        };

        Ok(Self {
            routing_indicator: if indicator & IND_ROUTE_ON_SSN != 0 {
                RoutingIndicator::RouteOnSsn
            } else {
                RoutingIndicator::RouteOnGt
            },
            national: indicator & IND_NATIONAL != 0,
            point_code: (indicator & IND_POINT_CODE != 0).then_some(point_code),
            subsystem_number: (indicator & IND_SSN != 0).then_some(ssn),
            global_title,
        })
    }

    /// Address indicator octet
    pub fn indicator(&self) -> u8 {
        let mut ind = 0;
        if self.point_code.is_some() {
            ind |= IND_POINT_CODE;
        }
        if self.subsystem_number.is_some() {
            ind |= IND_SSN;
        }
        if let Some(gt) = &self.global_title {
            ind |= gt.indicator() << 2;
        }
        if self.routing_indicator == RoutingIndicator::RouteOnSsn {
            ind |= IND_ROUTE_ON_SSN;
        }
        if self.national {
            ind |= IND_NATIONAL;
        }
        ind
    }

    /// Serialize the address without its length octet
    pub fn serialize(&self, buf: &mut BytesMut) -> Result<()> {
        if self.point_code.is_none()
            && self.subsystem_number.is_none()
            && self.global_title.is_none()
        {
            return Err(Error::EmptyAddress);
        }

        buf.put_u8(self.indicator());
        if let Some(pc) = self.point_code {
            if pc > MAX_POINT_CODE {
                return Err(Error::PointCodeOutOfRange(pc));
            }
            buf.put_u16_le(pc);
        }
        if let Some(ssn) = self.subsystem_number {
            buf.put_u8(ssn);
        }
        if let Some(gt) = &self.global_title {
            gt.serialize(buf)?;
        }
        Ok(())
    }

    /// Serialized address bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        self.serialize(&mut buf)?;
        Ok(buf.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gti4_address_from_indicator() {
        let addr = RoutingAddress::from_indicator(0x12, 0, 6, 0, 1, 2, 4, "817085004213").unwrap();
        assert_eq!(addr.point_code, None);
        assert_eq!(addr.subsystem_number, Some(6));
        assert_eq!(addr.routing_indicator, RoutingIndicator::RouteOnGt);
        assert_eq!(addr.indicator(), 0x12);

        assert_eq!(
            addr.to_bytes().unwrap(),
            vec![0x12, 0x06, 0x00, 0x12, 0x04, 0x18, 0x07, 0x58, 0x00, 0x24, 0x31]
        );
    }

    #[test]
    fn test_point_code_is_little_endian() {
        let addr = RoutingAddress::point_code_ssn(0x1234, 8);
        assert_eq!(addr.to_bytes().unwrap(), vec![0x43, 0x34, 0x12, 0x08]);
    }

    #[test]
    fn test_point_code_range() {
        let addr = RoutingAddress::point_code_ssn(0x4000, 8);
        assert_eq!(addr.to_bytes(), Err(Error::PointCodeOutOfRange(0x4000)));
    }

    #[test]
    fn test_gti1_sets_odd_flag() {
        let addr = RoutingAddress::from_indicator(0x06, 0, 7, 0, 0, 0, 4, "123").unwrap();
        assert_eq!(
            addr.to_bytes().unwrap(),
            vec![0x06, 0x07, 0x84, 0x21, 0x03]
        );
    }

    #[test]
    fn test_gti2_translation_type_only() {
        let addr = RoutingAddress::from_indicator(0x0A, 0, 7, 9, 0, 0, 0, "12").unwrap();
        assert_eq!(addr.to_bytes().unwrap(), vec![0x0A, 0x07, 0x09, 0x21]);
    }

    #[test]
    fn test_gti2_rejects_odd_digits() {
        let odd = RoutingAddress::from_indicator(0x0A, 0, 7, 9, 0, 0, 0, "1").unwrap();
        assert_eq!(odd.to_bytes(), Err(Error::OddDigitCount { gti: 2, digits: 1 }));

        let even = RoutingAddress::from_indicator(0x0A, 0, 7, 9, 0, 0, 0, "10").unwrap();
        assert_eq!(even.to_bytes().unwrap(), vec![0x0A, 0x07, 0x09, 0x01]);
    }

    #[test]
    fn test_non_bcd_encoding_scheme_rejected() {
        for digits in ["123", "1230"] {
            let addr = RoutingAddress::from_indicator(0x12, 0, 6, 0, 1, 0, 4, digits).unwrap();
            assert!(matches!(
                addr.to_bytes(),
                Err(Error::EncodingSchemeMismatch { scheme: 0, .. })
            ));
        }
        let gti3 = RoutingAddress::from_indicator(0x0E, 0, 6, 0, 1, 3, 0, "12").unwrap();
        assert!(gti3.to_bytes().is_err());
    }

    #[test]
    fn test_masked_fields_rejected() {
        let addr = RoutingAddress::from_indicator(0x12, 0, 6, 0, 0x11, 2, 4, "12").unwrap();
        assert_eq!(
            addr.to_bytes(),
            Err(Error::FieldOutOfRange {
                field: "numbering plan",
                value: 0x11,
                max: 0x0F
            })
        );

        let addr = RoutingAddress::from_indicator(0x06, 0, 6, 0, 0, 0, 0x84, "12").unwrap();
        assert!(matches!(
            addr.to_bytes(),
            Err(Error::FieldOutOfRange { field: "nature of address", .. })
        ));
    }

    #[test]
    fn test_encoding_scheme_must_match_digits() {
        let addr = RoutingAddress::from_indicator(0x12, 0, 6, 0, 1, 2, 4, "12345").unwrap();
        assert_eq!(
            addr.to_bytes(),
            Err(Error::EncodingSchemeMismatch { scheme: 2, digits: 5 })
        );
    }

    #[test]
    fn test_e164_picks_encoding_scheme() {
        match GlobalTitle::e164("12345") {
            GlobalTitle::Full { es, .. } => assert_eq!(es, ENCODING_SCHEME_BCD_ODD),
            other => panic!("unexpected {:?}", other),
        }
        match GlobalTitle::e164("1234") {
            GlobalTitle::Full { es, .. } => assert_eq!(es, ENCODING_SCHEME_BCD_EVEN),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_gti() {
        assert_eq!(
            RoutingAddress::from_indicator(0x16, 0, 6, 0, 1, 2, 4, "12"),
            Err(Error::UnsupportedGlobalTitleIndicator(5))
        );
    }

    #[test]
    fn test_empty_address() {
        assert_eq!(RoutingAddress::default().to_bytes(), Err(Error::EmptyAddress));
    }

    #[test]
    fn test_invalid_digit_surfaces() {
        let addr = RoutingAddress::global_title(6, GlobalTitle::e164("81708x"));
        assert!(matches!(addr.to_bytes(), Err(Error::InvalidDigit { digit: 'x', .. })));
    }
}
