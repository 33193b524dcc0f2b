use std::fs;

use pcon::io::{deserialize, read_header, read_payload, write};
use pcon::{Counter, Error, PackedStore, Solid, data_size, seq_to_value};

fn v(seq: &[u8]) -> u64 {
    seq_to_value(seq, seq.len() as u8).unwrap()
}

fn sample_counter() -> Counter {
    let mut counter = Counter::new(5, 3).unwrap();
    counter.count_sequence(b"GTTCTGCAAATTAGAACAGACAATACACTGGCAGGCGTTGCGTTGGGGGAGATCTTCC");
    counter.count_sequence(b"AAAAAAAAAAAAAAAAAAAAA");
    counter
}

#[test]
fn byte_layout() {
    // k=1: slot 0 is {A, T}, slot 1 is {C, G}
    let mut counter = Counter::new(1, 8).unwrap();
    counter.set(v(b"T"), 3);
    counter.set(v(b"C"), 5);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("k1.pcon");
    write(&counter, &path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), vec![1, 8, 3, 5]);

    let mut solid = Solid::new(1).unwrap();
    solid.set(v(b"A"), true);
    let path = dir.path().join("k1.solid");
    write(&solid, &path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), vec![1, 1, 0b01]);
}

#[test]
fn round_trip() {
    let counter = sample_counter();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("count.pcon");
    counter.save(&path).unwrap();

    assert_eq!(
        fs::metadata(&path).unwrap().len(),
        2 + data_size(5, 3).unwrap()
    );
    assert_eq!(read_header(&path).unwrap(), (5, 3));

    let mut fresh = Counter::new(5, 3).unwrap();
    deserialize(&mut fresh, &path).unwrap();
    assert_eq!(fresh.payload(), counter.payload());
    assert_eq!(fresh, counter);

    assert_eq!(Counter::load(&path).unwrap(), counter);
}

#[test]
fn deserialize_replaces_contents() {
    let counter = sample_counter();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("count.pcon");
    counter.save(&path).unwrap();

    let mut other = Counter::new(5, 3).unwrap();
    other.set(v(b"CCCCC"), 7);
    deserialize(&mut other, &path).unwrap();
    assert_eq!(other, counter);
}

#[test]
fn raw_payload() {
    let counter = sample_counter();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("count.pcon");
    counter.save(&path).unwrap();

    let (k, bit_width) = read_header(&path).unwrap();
    let mut buffer = vec![0u8; data_size(k, bit_width).unwrap() as usize];
    read_payload(&path, &mut buffer).unwrap();
    assert_eq!(&buffer[..], counter.payload());

    let mut wrong = vec![0u8; buffer.len() - 1];
    assert!(matches!(read_payload(&path, &mut wrong), Err(Error::Format(_))));
}

#[test]
fn truncated_and_oversized_files() {
    let counter = sample_counter();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("count.pcon");
    counter.save(&path).unwrap();
    let bytes = fs::read(&path).unwrap();

    let short = dir.path().join("short.pcon");
    fs::write(&short, &bytes[..bytes.len() - 1]).unwrap();
    let mut fresh = Counter::new(5, 3).unwrap();
    assert!(matches!(deserialize(&mut fresh, &short), Err(Error::Format(_))));
    assert!(matches!(Counter::load(&short), Err(Error::Format(_))));

    let long = dir.path().join("long.pcon");
    let mut extra = bytes.clone();
    extra.push(0);
    fs::write(&long, &extra).unwrap();
    assert!(matches!(Counter::load(&long), Err(Error::Format(_))));

    let header_only = dir.path().join("header.pcon");
    fs::write(&header_only, [5u8]).unwrap();
    assert!(matches!(read_header(&header_only), Err(Error::Format(_))));
}

#[test]
fn geometry_mismatch() {
    let counter = sample_counter();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("count.pcon");
    counter.save(&path).unwrap();

    let mut other_k = Counter::new(3, 3).unwrap();
    assert!(matches!(deserialize(&mut other_k, &path), Err(Error::Format(_))));
    let mut other_width = Counter::new(5, 4).unwrap();
    assert!(matches!(deserialize(&mut other_width, &path), Err(Error::Format(_))));
    let mut solid = Solid::new(5).unwrap();
    assert!(matches!(deserialize(&mut solid, &path), Err(Error::Format(_))));
    assert!(matches!(Solid::load(&path), Err(Error::Format(_))));
}

#[test]
fn invalid_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.pcon");
    fs::write(&path, [4u8, 8, 0, 0]).unwrap();
    assert!(matches!(Counter::load(&path), Err(Error::Format(_))));
    fs::write(&path, [3u8, 0]).unwrap();
    assert!(matches!(Counter::load(&path), Err(Error::Format(_))));
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.pcon");
    assert!(matches!(read_header(&path), Err(Error::FileNotFound(_))));
    assert!(matches!(Counter::load(&path), Err(Error::FileNotFound(_))));
}

#[test]
fn unwritable_destination() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no_such_dir").join("count.pcon");
    assert!(matches!(sample_counter().save(&path), Err(Error::Io(_))));
}

#[test]
fn solid_round_trip() {
    let solid = Solid::from_counter(&sample_counter(), 2).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("count.solid");
    solid.save(&path).unwrap();
    assert_eq!(read_header(&path).unwrap(), (5, 1));
    assert_eq!(Solid::load(&path).unwrap(), solid);
}

#[test]
fn failed_deserialize_keeps_contents() {
    let mut counter = Counter::new(3, 8).unwrap();
    counter.set(v(b"AAA"), 9);
    let dir = tempfile::tempdir().unwrap();

    let mut source = Counter::new(3, 8).unwrap();
    source.count_sequence(b"ACGTTGCAGGTCCA");
    let mut bytes = Vec::new();
    pcon::io::write_to(&source, &mut bytes).unwrap();

    let long = dir.path().join("long.pcon");
    let mut extra = bytes.clone();
    extra.push(0xab);
    fs::write(&long, &extra).unwrap();
    let before = counter.clone();
    assert!(matches!(deserialize(&mut counter, &long), Err(Error::Format(_))));
    assert_eq!(counter, before);
    assert_eq!(counter.get(v(b"AAA")), 9);

    let short = dir.path().join("short.pcon");
    fs::write(&short, &bytes[..bytes.len() / 2]).unwrap();
    assert!(matches!(deserialize(&mut counter, &short), Err(Error::Format(_))));
    assert_eq!(counter, before);
}

#[test]
fn header_alone_does_not_size_the_load() {
    // both headers declare payloads far larger than memory
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.pcon");
    fs::write(&path, [21u8, 8]).unwrap();
    assert!(matches!(Counter::load(&path), Err(Error::Format(_))));
    fs::write(&path, [31u8, 1, 0, 0]).unwrap();
    assert!(matches!(Solid::load(&path), Err(Error::Format(_))));
}
