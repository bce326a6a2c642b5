#![no_main]

use libfuzzer_sys::fuzz_target;
use plymit::{Document, Encoding, Error, Reader};

fuzz_target!(|data: &[u8]| {
    // We are just interested in panics or other even worse crashes, so errors
    // returned by the parser are fine.
    let partial = match Reader::new(data) {
        Ok(reader) => reader.read_partial(),
        Err(_) => return,
    };

    // Everything that was read must be writable and read back identically.
    // We compare the written bytes, as documents containing NaN are never
    // equal to themselves.
    if partial.error.is_none() {
        let doc = partial.document;
        for &encoding in &[Encoding::Ascii, Encoding::BinaryLittleEndian, Encoding::BinaryBigEndian] {
            // Non-empty groups without properties only exist in ASCII.
            let bytes = match doc.to_bytes(encoding) {
                Ok(bytes) => bytes,
                Err(Error::SchemaMismatch { .. }) if encoding.is_binary() => continue,
                Err(e) => panic!("writing a parsed document failed: {:?}", e),
            };
            let again = Document::read(&bytes[..]).expect("reading a written document failed");
            assert_eq!(again.to_bytes(encoding).expect("writing again failed"), bytes);
        }
    }
});
