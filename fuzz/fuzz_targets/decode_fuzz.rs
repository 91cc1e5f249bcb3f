//! Decode fuzz target: arbitrary text as a message body, and as layout source.
//! Neither decoding nor layout parsing may panic; both return Ok or Err.
//! Build with: cargo fuzz run decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
const LAYOUT: &str = "
header { SERV: alpha(4); COD: numeric(2); }
section response {
    ESTADO: alpha(2);
    CANT-REG: numeric(2);
    occurrence occ_1 count 3 {
        F1: alpha(5);
        CANT-REG-D: numeric(1);
        occurrence occ_1_1 count 2 { D: alpha(2); }
    }
    FIN: alpha(3);
}
";

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    if let Ok(schema) = mqcodec::parse_layout(LAYOUT) {
        let codec = mqcodec::Codec::new(schema);
        if let Ok(message) = codec.decode("response", s) {
            let _ = codec.encode("response", &message);
        }
        let _ = mqcodec::check_frame(codec.schema(), s);
    }
    let _ = mqcodec::parse_layout(s);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
