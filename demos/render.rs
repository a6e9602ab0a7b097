use iching::EncodeOptions;

/// Render a payload into a PNG containing an IChing code.
fn main() {
    let mut args = std::env::args().skip(1);
    let payload = args.next().unwrap_or_else(|| "HELLO WORLD".into());
    let path = args.next().unwrap_or_else(|| "iching.png".into());

    let (code, image) =
        iching::encode(&payload, &EncodeOptions::default()).expect("encoding failed");
    let buffer = image::RgbaImage::from_raw(image.width as u32, image.height as u32, image.data)
        .expect("image buffer size mismatch");
    buffer.save(&path).expect("could not write the image");
    println!(
        "wrote a {0}x{0} symbol code ({1} px) to {2}",
        code.size, image.width, path
    );
}
