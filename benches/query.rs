// ABOUTME: Benchmarks for DTB decoding and query resolution
// ABOUTME: Measures tree construction and alias/path/property lookups using Criterion

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dtb_query::{Clause, DeviceTreeParser, DtbQuery, Expected};

const FDT_BEGIN_NODE: u32 = 0x1;
const FDT_END_NODE: u32 = 0x2;
const FDT_PROP: u32 = 0x3;
const FDT_END: u32 = 0x9;

/// Minimal blob writer: strings are not deduplicated.
#[derive(Default)]
struct Blob {
    structure: Vec<u8>,
    strings: Vec<u8>,
}

impl Blob {
    fn word(&mut self, word: u32) {
        self.structure.extend_from_slice(&word.to_be_bytes());
    }

    fn pad(&mut self) {
        while self.structure.len() % 4 != 0 {
            self.structure.push(0);
        }
    }

    fn begin(&mut self, name: &str) {
        self.word(FDT_BEGIN_NODE);
        self.structure.extend_from_slice(name.as_bytes());
        self.structure.push(0);
        self.pad();
    }

    fn end(&mut self) {
        self.word(FDT_END_NODE);
    }

    fn prop(&mut self, name: &str, data: &[u8]) {
        let name_offset = self.strings.len() as u32;
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        self.word(FDT_PROP);
        self.word(data.len() as u32);
        self.word(name_offset);
        self.structure.extend_from_slice(data);
        self.pad();
    }

    fn cells(&mut self, name: &str, cells: &[u32]) {
        let data: Vec<u8> = cells.iter().flat_map(|c| c.to_be_bytes()).collect();
        self.prop(name, &data);
    }

    fn string(&mut self, name: &str, value: &str) {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        self.prop(name, &data);
    }

    fn finish(mut self) -> Vec<u8> {
        self.word(FDT_END);
        let off_struct = 40 + 16;
        let off_strings = off_struct + self.structure.len();
        let total = off_strings + self.strings.len();
        let header = [
            0xd00d_feed,
            total as u32,
            off_struct as u32,
            off_strings as u32,
            40,
            17,
            16,
            0,
            self.strings.len() as u32,
            self.structure.len() as u32,
        ];
        let mut blob: Vec<u8> = header.iter().flat_map(|f: &u32| f.to_be_bytes()).collect();
        blob.extend_from_slice(&[0u8; 16]);
        blob.extend_from_slice(&self.structure);
        blob.extend_from_slice(&self.strings);
        blob
    }
}

/// A bus with `devices` UART-like children behind a translating `ranges`
fn synthetic_dtb(devices: u32) -> Vec<u8> {
    let mut blob = Blob::default();
    blob.begin("");
    blob.cells("#address-cells", &[2]);
    blob.cells("#size-cells", &[1]);

    blob.begin("aliases");
    blob.string("serial0", "/soc/serial@7e000000");
    blob.string("last", &format!("/soc/serial@{:x}", 0x7e00_0000 + (devices - 1) * 0x1000));
    blob.end();

    blob.begin("soc");
    blob.prop("compatible", b"simple-bus\0");
    blob.cells("#address-cells", &[1]);
    blob.cells("#size-cells", &[1]);
    blob.cells("ranges", &[0x7e00_0000, 0x0, 0xfe00_0000, 0x0180_0000]);
    for i in 0..devices {
        let address = 0x7e00_0000 + i * 0x1000;
        blob.begin(&format!("serial@{address:x}"));
        blob.prop("compatible", b"brcm,bcm2835-aux-uart\0");
        blob.cells("reg", &[address, 0x40]);
        blob.cells("interrupts", &[0x0, 0x5d + i, 0x4]);
        blob.string("status", "okay");
        blob.end();
    }
    blob.end();

    blob.end();
    blob.finish()
}

fn bench_tree_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_tree");
    for devices in [16u32, 256, 1024] {
        let dtb_data = synthetic_dtb(devices);
        group.bench_with_input(BenchmarkId::from_parameter(devices), &dtb_data, |b, data| {
            b.iter(|| DeviceTreeParser::new(data).parse_tree().unwrap())
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let devices = 256;
    let dtb_data = synthetic_dtb(devices);
    let engine = DtbQuery::new(&dtb_data).unwrap();
    let last = 0x7e00_0000 + (devices - 1) * 0x1000;

    let mut group = c.benchmark_group("resolve");

    group.bench_function("alias", |b| {
        b.iter(|| engine.resolve(&[Clause::alias("last")]).unwrap())
    });

    let pattern = format!("/soc/serial@{last:x}");
    group.bench_function("path", |b| {
        b.iter(|| engine.resolve(&[Clause::path(pattern.as_str())]).unwrap())
    });

    group.bench_function("properties", |b| {
        b.iter(|| {
            engine
                .resolve(&[Clause::properties([
                    ("reg[0]", Expected::from(last)),
                    ("status", Expected::from("okay")),
                ])])
                .unwrap()
        })
    });

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let dtb_data = synthetic_dtb(64);

    c.bench_function("full_query_pipeline", |b| {
        b.iter(|| {
            let engine = DtbQuery::new(&dtb_data).unwrap();
            let result = engine
                .resolve(&[Clause::alias("serial0"), Clause::path("/soc/serial@.*")])
                .unwrap();
            engine.tree().iter_nodes().count() + result.query.len()
        })
    });
}

criterion_group!(benches, bench_tree_parsing, bench_resolve, bench_full_pipeline);
criterion_main!(benches);
