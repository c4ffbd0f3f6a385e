// cargo fuzz run decode corpus/decode -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

use gifread::Decoder;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut reader) = Decoder::new(Cursor::new(data)).open() {
        while let Ok(Some(_frame)) = reader.next_frame() {}
    }
});
