//! Card detail disclosure (`UPDATE_DATA` / `UPDATE_CARD` payloads).
//!
//! A card's details arrive as a run of entries, each
//! `size: u16, tag: u32, value: [u8; size - 4]`, closed by an `END` tag.
//! A slot that starts with size 0 is an empty zone. Every entry is read
//! through its own sub-reader, so a tag this crate does not know is
//! skipped by its declared length and the next entry lines up.

use crate::{
    Attribute, CardType, LocInfo, PacketReader, Player, Position, ProtocolError, Race,
};

/// Query tag bits.
pub mod tag {
    pub const ID: u32 = 0x1;
    pub const POSITION: u32 = 0x2;
    pub const ALIAS: u32 = 0x4;
    pub const TYPE: u32 = 0x8;
    pub const LEVEL: u32 = 0x10;
    pub const RANK: u32 = 0x20;
    pub const ATTRIBUTE: u32 = 0x40;
    pub const RACE: u32 = 0x80;
    pub const ATTACK: u32 = 0x100;
    pub const DEFENSE: u32 = 0x200;
    pub const BASE_ATTACK: u32 = 0x400;
    pub const BASE_DEFENSE: u32 = 0x800;
    pub const REASON: u32 = 0x1000;
    pub const REASON_CARD: u32 = 0x2000;
    pub const EQUIP_CARD: u32 = 0x4000;
    pub const TARGET_CARD: u32 = 0x8000;
    pub const OVERLAY_CARD: u32 = 0x10000;
    pub const COUNTERS: u32 = 0x20000;
    pub const CONTROLLER: u32 = 0x40000;
    pub const STATUS: u32 = 0x80000;
    pub const IS_PUBLIC: u32 = 0x100000;
    pub const LSCALE: u32 = 0x200000;
    pub const RSCALE: u32 = 0x400000;
    pub const LINK: u32 = 0x800000;
    pub const IS_HIDDEN: u32 = 0x1000000;
    pub const COVER: u32 = 0x2000000;
    pub const END: u32 = 0x80000000;
}

/// One disclosed field of a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardQuery {
    Id(u32),
    Position(Position),
    Alias(u32),
    Type(CardType),
    Level(u32),
    Rank(u32),
    Attribute(Attribute),
    Race(Race),
    Attack(i32),
    Defense(i32),
    BaseAttack(i32),
    BaseDefense(i32),
    Reason(u32),
    ReasonCard(LocInfo),
    EquipCard(LocInfo),
    TargetCards(Vec<LocInfo>),
    /// Ids of the material stacked under the card.
    Overlays(Vec<u32>),
    /// `(counter type, count)` pairs.
    Counters(Vec<(u16, u16)>),
    Controller(Player),
    Status(u32),
    IsPublic(bool),
    LeftScale(u32),
    RightScale(u32),
    Link { rating: u32, marker: u32 },
    IsHidden(bool),
    Cover(u32),
}

/// Reads one card's entries, up to and including its `END` tag.
///
/// Returns `None` for an empty slot (leading size 0).
pub fn read_card_queries(
    r: &mut PacketReader<'_>,
) -> Result<Option<Vec<CardQuery>>, ProtocolError> {
    let mut queries = Vec::new();
    let mut first = true;
    loop {
        let size = usize::from(r.read_u16()?);
        if size == 0 {
            return Ok(if first { None } else { Some(queries) });
        }
        first = false;
        if size < 4 {
            return Err(ProtocolError::InvalidMessage(format!(
                "query entry of {size} bytes is shorter than its tag"
            )));
        }
        let query_tag = r.read_u32()?;
        let mut entry = r.sub_reader(size - 4)?;
        if query_tag == tag::END {
            return Ok(Some(queries));
        }
        match read_entry(query_tag, &mut entry)? {
            Some(query) => queries.push(query),
            None => tracing::trace!(tag = query_tag, size, "skipping unknown query tag"),
        }
    }
}

/// Reads consecutive slots until the payload is exhausted.
///
/// `UPDATE_DATA` sends one slot per position of a location, in order.
pub fn read_query_slots(
    r: &mut PacketReader<'_>,
) -> Result<Vec<Option<Vec<CardQuery>>>, ProtocolError> {
    let mut slots = Vec::new();
    while !r.is_empty() {
        slots.push(read_card_queries(r)?);
    }
    Ok(slots)
}

fn read_entry(
    query_tag: u32,
    r: &mut PacketReader<'_>,
) -> Result<Option<CardQuery>, ProtocolError> {
    let query = match query_tag {
        tag::ID => CardQuery::Id(r.read_u32()?),
        tag::POSITION => CardQuery::Position(r.read_position()?),
        tag::ALIAS => CardQuery::Alias(r.read_u32()?),
        tag::TYPE => CardQuery::Type(CardType::from_bits_retain(r.read_u32()?)),
        tag::LEVEL => CardQuery::Level(r.read_u32()?),
        tag::RANK => CardQuery::Rank(r.read_u32()?),
        tag::ATTRIBUTE => CardQuery::Attribute(Attribute::from_bits_retain(r.read_u32()?)),
        tag::RACE => {
            let bits = if r.remaining() >= 8 {
                r.read_u64()?
            } else {
                u64::from(r.read_u32()?)
            };
            CardQuery::Race(Race::from_bits_retain(bits))
        }
        tag::ATTACK => CardQuery::Attack(r.read_i32()?),
        tag::DEFENSE => CardQuery::Defense(r.read_i32()?),
        tag::BASE_ATTACK => CardQuery::BaseAttack(r.read_i32()?),
        tag::BASE_DEFENSE => CardQuery::BaseDefense(r.read_i32()?),
        tag::REASON => CardQuery::Reason(r.read_u32()?),
        tag::REASON_CARD => CardQuery::ReasonCard(r.read_loc_info()?),
        tag::EQUIP_CARD => CardQuery::EquipCard(r.read_loc_info()?),
        tag::TARGET_CARD => {
            let count = r.read_u32()?;
            let targets = (0..count)
                .map(|_| r.read_loc_info())
                .collect::<Result<_, _>>()?;
            CardQuery::TargetCards(targets)
        }
        tag::OVERLAY_CARD => {
            let count = r.read_u32()?;
            let ids = (0..count).map(|_| r.read_u32()).collect::<Result<_, _>>()?;
            CardQuery::Overlays(ids)
        }
        tag::COUNTERS => {
            let count = r.read_u32()?;
            let counters = (0..count)
                .map(|_| {
                    r.read_u32()
                        .map(|packed| ((packed & 0xffff) as u16, (packed >> 16) as u16))
                })
                .collect::<Result<_, _>>()?;
            CardQuery::Counters(counters)
        }
        tag::CONTROLLER => CardQuery::Controller(r.read_player()?),
        tag::STATUS => CardQuery::Status(r.read_u32()?),
        tag::IS_PUBLIC => CardQuery::IsPublic(r.read_bool()?),
        tag::LSCALE => CardQuery::LeftScale(r.read_u32()?),
        tag::RSCALE => CardQuery::RightScale(r.read_u32()?),
        tag::LINK => CardQuery::Link {
            rating: r.read_u32()?,
            marker: r.read_u32()?,
        },
        tag::IS_HIDDEN => CardQuery::IsHidden(r.read_bool()?),
        tag::COVER => CardQuery::Cover(r.read_u32()?),
        _ => return Ok(None),
    };
    Ok(Some(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Location, PacketWriter};

    fn entry(w: &mut PacketWriter, query_tag: u32, value: &[u8]) {
        w.write_u16((value.len() + 4) as u16);
        w.write_u32(query_tag);
        w.write_bytes(value);
    }

    fn end(w: &mut PacketWriter) {
        entry(w, tag::END, &[]);
    }

    #[test]
    fn test_read_card_queries_basic_fields() {
        let mut w = PacketWriter::new();
        entry(&mut w, tag::ID, &89631139u32.to_le_bytes());
        entry(&mut w, tag::ATTACK, &3000i32.to_le_bytes());
        entry(&mut w, tag::LEVEL, &8u32.to_le_bytes());
        end(&mut w);
        let bytes = w.into_bytes();
        let mut r = PacketReader::new(&bytes);
        let queries = read_card_queries(&mut r).unwrap().unwrap();
        assert_eq!(
            queries,
            vec![CardQuery::Id(89631139), CardQuery::Attack(3000), CardQuery::Level(8)]
        );
        assert!(r.is_empty());
    }

    #[test]
    fn test_read_card_queries_skips_unknown_tag_by_size() {
        let mut w = PacketWriter::new();
        entry(&mut w, 0x4000_0000, &[0xaa; 7]);
        entry(&mut w, tag::ID, &42u32.to_le_bytes());
        end(&mut w);
        let bytes = w.into_bytes();
        let queries = read_card_queries(&mut PacketReader::new(&bytes)).unwrap().unwrap();
        assert_eq!(queries, vec![CardQuery::Id(42)]);
    }

    #[test]
    fn test_read_card_queries_empty_slot() {
        let mut r = PacketReader::new(&[0, 0]);
        assert_eq!(read_card_queries(&mut r).unwrap(), None);
    }

    #[test]
    fn test_read_card_queries_counters_unpack_type_and_count() {
        let mut w = PacketWriter::new();
        let mut value = 1u32.to_le_bytes().to_vec();
        value.extend_from_slice(&(0x0003_1019u32).to_le_bytes());
        entry(&mut w, tag::COUNTERS, &value);
        end(&mut w);
        let bytes = w.into_bytes();
        let queries = read_card_queries(&mut PacketReader::new(&bytes)).unwrap().unwrap();
        assert_eq!(queries, vec![CardQuery::Counters(vec![(0x1019, 3)])]);
    }

    #[test]
    fn test_read_card_queries_equip_card_loc_info() {
        let mut w = PacketWriter::new();
        entry(&mut w, tag::EQUIP_CARD, &[1, 0x04, 2, 0, 0, 0, 1, 0, 0, 0]);
        end(&mut w);
        let bytes = w.into_bytes();
        let queries = read_card_queries(&mut PacketReader::new(&bytes)).unwrap().unwrap();
        let CardQuery::EquipCard(loc) = &queries[0] else {
            panic!("expected equip card, got {queries:?}");
        };
        assert_eq!(loc.controller, Player::Opponent);
        assert_eq!(loc.location, Location::MONSTER_ZONE);
        assert_eq!(loc.index, 2);
    }

    #[test]
    fn test_read_card_queries_truncated_entry_fails() {
        let mut w = PacketWriter::new();
        w.write_u16(8);
        w.write_u32(tag::ID);
        w.write_u8(1);
        let bytes = w.into_bytes();
        assert!(read_card_queries(&mut PacketReader::new(&bytes)).is_err());
    }

    #[test]
    fn test_read_query_slots_mixes_empty_and_filled() {
        let mut w = PacketWriter::new();
        w.write_u16(0);
        entry(&mut w, tag::ID, &7u32.to_le_bytes());
        end(&mut w);
        w.write_u16(0);
        let bytes = w.into_bytes();
        let slots = read_query_slots(&mut PacketReader::new(&bytes)).unwrap();
        assert_eq!(slots, vec![None, Some(vec![CardQuery::Id(7)]), None]);
    }
}
