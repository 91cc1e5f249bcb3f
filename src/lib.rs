//! # mqcodec: fixed-width MQ message codec
//!
//! Encodes and decodes positional, character-based messages exchanged with
//! mainframe-style MQ services. A [`Schema`] describes a fixed header block plus one body
//! layout per logical section (`request`, `response`, ...). Bodies may hold repeating
//! groups ("occurrences"), nested to any depth, whose child count is read from a counter
//! field or taken from the schema.
//!
//! ## Schema sources
//!
//! - JSON ([`Schema::from_json`]): `header.fields`, `sections.<name>.fields`, occurrence
//!   entries tagged `"type": "occurrence"`.
//! - Layout notation ([`parse_layout`]):
//!
//! ```text
//! header length 16 {
//!     SERVICIO: alpha(10);
//!     TIPO-MENSAJE: alpha(4);
//!     CODIGO-RETORNO: numeric(2);
//! }
//!
//! section response {
//!     ESTADO: alpha(2);
//!     CANT-REG: numeric(2);
//!     occurrence occ_1 index 1 count 5 {
//!         F1: alpha(5);
//!         F2: numeric(4);
//!     }
//! }
//! ```
//!
//! ## Values
//!
//! Numeric fields are right-aligned and zero-filled, everything else left-aligned and
//! space-filled; values longer than the field are truncated and a blank value is written
//! as spaces. Decoded fields are trimmed. Offsets count characters, not bytes.
//!
//! ## Usage
//!
//! ```no_run
//! use mqcodec::{parse_layout, Codec, Record};
//!
//! let schema = parse_layout("section response { ESTADO: alpha(2); }").unwrap();
//! let codec = Codec::new(schema);
//! let body = codec.encode_body("response", &Record::new().with("ESTADO", "OK")).unwrap();
//! assert_eq!(codec.decode_body("response", &body).unwrap().text("ESTADO"), Some("OK"));
//! ```

pub mod clean;
pub mod codec;
pub mod config;
pub mod dump;
pub mod format;
pub mod frame;
pub mod header;
pub mod occurrence;
pub mod parser;
pub mod schema;
pub mod value;

pub use clean::{clean_message, clean_record, CleanMode};
pub use codec::{decode, encode, Codec, CodecError, Diagnostic, Message, Outcome};
pub use config::{CodecConfig, CounterMatcher, SectionRules};
pub use dump::dump_record;
pub use format::{extract, format_value};
pub use frame::{check_frame, decode_frame, detect_section, DecodedFrame, FrameCheckError};
pub use header::{decode_header, encode_header, header_length};
pub use occurrence::is_counter_field;
pub use parser::parse_layout;
pub use schema::{ElementDef, FieldDef, FieldKind, HeaderLayout, OccurrenceDef, SectionLayout, Schema};
pub use value::{Record, Value};
