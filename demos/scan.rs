use iching::DecodeOptions;

/// Decode an IChing code from an image file.
fn main() {
    let path = std::env::args().nth(1).expect("usage: scan <image-file>");
    let rgba = image::open(&path).expect("could not open the image").to_rgba8();
    let (width, height) = rgba.dimensions();

    match iching::decode(
        rgba.as_raw(),
        width as usize,
        height as usize,
        &DecodeOptions::default(),
    ) {
        Ok(decoded) => println!(
            "version {}, {}x{} symbols: {}",
            decoded.version, decoded.size, decoded.size, decoded.data
        ),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
