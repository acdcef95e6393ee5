use super::*;
use crate::toc::toc_len;
use common::testdata_files;
use proptest::prelude::*;
use std::time::{SystemTime, UNIX_EPOCH};

fn arc(bytes: Vec<u8>) -> Arc<[u8]> {
    Arc::from(bytes.into_boxed_slice())
}

fn write_temp_file(prefix: &str, bytes: &[u8]) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let mut path = std::env::temp_dir();
    path.push(format!("{prefix}-{}-{nanos}.cc", std::process::id()));
    fs::write(&path, bytes).expect("failed to write temp archive");
    path
}

fn sample_archive() -> Vec<u8> {
    let mut builder = ArchiveBuilder::new();
    builder
        .add_named("SKY.SKY", b"sky pixels".to_vec())
        .add_named("TOWN.GND", vec![0u8, 1, 2, 0x35, 0xFF])
        .add(0x1234, b"numbered".to_vec());
    builder.build().expect("sample archive must build")
}

#[test]
fn archive_reads_and_deobfuscates_payloads() {
    let archive = Archive::open_bytes(arc(sample_archive()), OpenOptions::default())
        .expect("sample archive must open");
    assert_eq!(archive.entry_count(), 3);
    assert!(!archive.has_save_archive());

    let sky = archive
        .file_by_name("sky.sky", Source::Main)
        .expect("SKY.SKY present");
    assert_eq!(sky.as_slice(), b"sky pixels");
    assert_eq!(sky.id(), name_id("SKY.SKY"));

    let ground = archive.file_by_name("TOWN.GND", Source::Main).expect("present");
    assert_eq!(ground.as_slice(), &[0u8, 1, 2, 0x35, 0xFF]);

    let raw = archive.raw(0x1234).expect("raw bytes present");
    let mut xored = raw.to_vec();
    cipher::xor_payload(&mut xored);
    assert_eq!(xored, b"numbered");
}

#[test]
fn payload_offsets_follow_the_table() {
    let archive = Archive::open_bytes(arc(sample_archive()), OpenOptions::default())
        .expect("sample archive must open");
    let first = archive.entry(name_id("SKY.SKY")).expect("entry");
    assert_eq!(first.offset as usize, toc_len(3));
    let second = archive.entry(name_id("TOWN.GND")).expect("entry");
    assert_eq!(second.offset, first.offset + first.size);
}

#[test]
fn xor_can_be_disabled() {
    let archive = Archive::open_bytes(
        arc(sample_archive()),
        OpenOptions {
            xor_payloads: false,
            build_save_archive: false,
        },
    )
    .expect("open");
    let stored = archive.file(0x1234, Source::Main).expect("present");
    assert_eq!(Some(stored.as_slice()), archive.raw(0x1234));
}

#[test]
fn missing_ids_are_not_errors() {
    let archive = Archive::open_bytes(arc(sample_archive()), OpenOptions::default())
        .expect("open");
    for id in [0u16, 1, 0xFFFF, name_id("NOPE.DAT")] {
        assert!(archive.entry(id).is_none());
        assert!(archive.file(id, Source::Main).is_none());
        assert!(archive.file(id, Source::Save).is_none());
    }

    let mut out = Vec::new();
    assert_eq!(
        archive
            .file_into(0xFFFF, Source::Main, &mut out)
            .expect("missing file is not an error"),
        None
    );
}

#[test]
fn first_duplicate_wins() {
    let mut builder = ArchiveBuilder::new();
    builder.add(7, b"first".to_vec()).add(7, b"second".to_vec());
    let archive = Archive::open_bytes(arc(builder.build().expect("build")), OpenOptions::default())
        .expect("open");
    assert_eq!(archive.entry_count(), 2);
    assert_eq!(
        archive.file(7, Source::Main).expect("present").as_slice(),
        b"first"
    );
}

#[test]
fn empty_archive_reports_everything_missing() {
    let archive = Archive::empty();
    assert_eq!(archive.entry_count(), 0);
    assert!(archive.file(name_id("SKY.SKY"), Source::Main).is_none());
    assert!(archive.save_entries().next().is_none());
}

#[test]
fn open_or_empty_degrades_on_missing_or_bad_file() {
    let missing = std::env::temp_dir().join("ccfile-definitely-missing.cc");
    assert_eq!(Archive::open_or_empty(&missing).entry_count(), 0);

    let path = write_temp_file("ccfile-zero-count", &[0, 0, 0, 0]);
    let archive = Archive::open_or_empty(&path);
    assert_eq!(archive.entry_count(), 0);
    let _ = fs::remove_file(&path);
}

#[test]
fn open_path_reads_file_from_disk() {
    let path = write_temp_file("ccfile-open", &sample_archive());
    let archive = Archive::open_path(&path).expect("open from disk");
    assert!(archive.contains("TOWN.GND"));
    let _ = fs::remove_file(&path);
}

#[test]
fn entry_past_end_of_file_is_rejected() {
    let mut bytes = sample_archive();
    bytes.truncate(bytes.len() - 1);
    assert!(matches!(
        Archive::open_bytes(arc(bytes), OpenOptions::default()),
        Err(Error::EntryOutOfBounds { .. })
    ));
}

fn save_bundle() -> Vec<u8> {
    let mut bundle = ArchiveBuilder::save_bundle();
    bundle
        .add_named("MAZE0001.DAT", vec![0xAA; 40])
        .add_named("PARTY.DAT", b"party record".to_vec());
    bundle.build().expect("bundle must build")
}

#[test]
fn save_archive_concatenates_slots_in_fixed_order() {
    let bundle = save_bundle();
    // Spread the bundle over three slots and leave the others absent; the order of
    // insertion into the main archive must not matter, only SAVE_SLOT_IDS order.
    let (a, rest) = bundle.split_at(5);
    let (b, c) = rest.split_at(17);

    let mut builder = ArchiveBuilder::new();
    builder
        .add(SAVE_SLOT_IDS[4], c.to_vec())
        .add_named("SKY.SKY", b"unrelated".to_vec())
        .add(SAVE_SLOT_IDS[0], a.to_vec())
        .add(SAVE_SLOT_IDS[2], b.to_vec());
    let archive = Archive::open_bytes(arc(builder.build().expect("build")), OpenOptions::default())
        .expect("open with save archive");

    assert!(archive.has_save_archive());
    assert_eq!(archive.save_archive_len(), a.len() + b.len() + c.len());
    assert_eq!(archive.save_entries().count(), 2);

    let maze = archive
        .file_by_name("MAZE0001.DAT", Source::Save)
        .expect("nested entry");
    assert_eq!(maze.as_slice(), &[0xAA; 40]);
    let party = archive
        .file_by_name("PARTY.DAT", Source::Save)
        .expect("nested entry");
    assert_eq!(party.as_slice(), b"party record");

    let nested = archive.save_entry(name_id("PARTY.DAT")).expect("entry");
    assert_eq!(nested.offset as usize, toc_len(2) + 40);
    assert!(archive.file_by_name("PARTY.DAT", Source::Main).is_none());
}

#[test]
fn save_archive_size_is_sum_of_present_slots() {
    let bundle = save_bundle();
    let mut builder = ArchiveBuilder::new();
    builder.add(SAVE_SLOT_IDS[5], bundle.clone());
    let archive = Archive::open_bytes(arc(builder.build().expect("build")), OpenOptions::default())
        .expect("open");
    let expected: usize = SAVE_SLOT_IDS
        .iter()
        .filter_map(|&id| archive.entry(id))
        .map(|entry| entry.size as usize)
        .sum();
    assert_eq!(archive.save_archive_len(), expected);
    assert_eq!(expected, bundle.len());
}

#[test]
fn corrupt_save_table_invalidates_archive() {
    let mut builder = ArchiveBuilder::new();
    builder.add(SAVE_SLOT_IDS[0], vec![0u8, 0, 1, 2]);
    let bytes = builder.build().expect("build");
    assert!(matches!(
        Archive::open_bytes(arc(bytes.clone()), OpenOptions::default()),
        Err(Error::EmptyTable)
    ));

    let skipped = Archive::open_bytes(
        arc(bytes),
        OpenOptions {
            xor_payloads: true,
            build_save_archive: false,
        },
    )
    .expect("save archive assembly disabled");
    assert!(!skipped.has_save_archive());
}

#[test]
fn file_cache_shares_buffers() {
    let archive = Archive::open_bytes(arc(sample_archive()), OpenOptions::default())
        .expect("open");
    let mut cache = FileCache::new();
    let first = cache
        .get_by_name(&archive, "SKY.SKY", Source::Main)
        .expect("present");
    let second = cache
        .get_by_name(&archive, "SKY.SKY", Source::Main)
        .expect("present");
    assert!(Arc::ptr_eq(&first.shared(), &second.shared()));
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&archive, 0xFFFF, Source::Main).is_none());
    assert_eq!(cache.len(), 1);
}

#[test]
fn retail_archives_open_and_read_every_entry() {
    let files = testdata_files("cc", "cc");
    if files.is_empty() {
        eprintln!("skipping retail_archives_open_and_read_every_entry: no .cc files in testdata/cc");
        return;
    }
    for path in files {
        let archive = Archive::open_path(&path)
            .unwrap_or_else(|err| panic!("failed to open {}: {err}", path.display()));
        for entry in archive.entries() {
            let file = archive
                .file(entry.id, Source::Main)
                .unwrap_or_else(|| panic!("entry {:#06x} unreadable in {}", entry.id, path.display()));
            assert_eq!(file.len(), entry.size as usize);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn open_bytes_is_panic_free_on_random_bytes(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let _ = Archive::open_bytes(arc(data), OpenOptions::default());
    }

    #[test]
    fn built_archives_roundtrip(payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 1..12)) {
        let mut builder = ArchiveBuilder::new();
        for (idx, payload) in payloads.iter().enumerate() {
            builder.add(0x4000 + idx as u16, payload.clone());
        }
        let archive = Archive::open_bytes(arc(builder.build().expect("build")), OpenOptions::default())
            .expect("built archive must open");
        for (idx, payload) in payloads.iter().enumerate() {
            let file = archive.file(0x4000 + idx as u16, Source::Main).expect("present");
            prop_assert_eq!(file.as_slice(), payload.as_slice());
        }
    }
}
