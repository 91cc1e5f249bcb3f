//! Benchmark: decode, encode and decode+encode of a response with a counter-driven group
//! of 50 movements, each carrying a nested group of details.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mqcodec::{parse_layout, Codec, Message, Record};

const LAYOUT: &str = r#"
header {
    SERVICIO: alpha(10);
    TIPO-MENSAJE: alpha(4);
    CODIGO-RETORNO: numeric(2);
}

section response {
    ESTADO: alpha(2);
    CANT-REG: numeric(3);
    occurrence occ_1 index 1 count 50 {
        FECHA: numeric(8);
        CONCEPTO: alpha(30);
        IMPORTE: numeric(12);
        CANT-REG-DET: numeric(1);
        occurrence occ_1_1 count 4 {
            DETALLE: alpha(20);
        }
    }
}
"#;

fn sample_message() -> Message {
    let movements: Vec<Record> = (0..50)
        .map(|i| {
            let details: Vec<Record> = (0..(i % 5))
                .map(|d| Record::new().with("DETALLE", format!("detalle {}", d)))
                .collect();
            Record::new()
                .with("FECHA", format!("202401{:02}", i % 28 + 1))
                .with("CONCEPTO", format!("movimiento numero {}", i))
                .with("IMPORTE", (i * 1375).to_string())
                .with("occ_1_1", details)
        })
        .collect();
    Message::new(
        Record::new()
            .with("SERVICIO", "MOVIMIENT")
            .with("TIPO-MENSAJE", "RESP")
            .with("CODIGO-RETORNO", "00"),
        Record::new().with("ESTADO", "OK").with("occ_1", movements),
    )
}

fn bench_codec(c: &mut Criterion) {
    let schema = parse_layout(LAYOUT).expect("parse layout");
    let codec = Codec::new(schema);
    let message = sample_message();
    let raw = codec.encode("response", &message).expect("encode");
    eprintln!("codec_bench: {} characters per message", raw.chars().count());

    c.bench_function("decode_response_50", |b| {
        b.iter(|| codec.decode("response", black_box(&raw)).expect("decode"))
    });

    c.bench_function("encode_response_50", |b| {
        b.iter(|| codec.encode("response", black_box(&message)).expect("encode"))
    });

    c.bench_function("decode_encode_response_50", |b| {
        b.iter(|| {
            let decoded = codec.decode("response", black_box(&raw)).expect("decode");
            black_box(codec.encode("response", &decoded).expect("encode"))
        })
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
