use famicore::{Cartridge, MapperRegistry, Nes};

/// Minimal NROM image with a small arithmetic loop at the reset vector.
fn build_demo_ines() -> Vec<u8> {
    let mut image = Vec::with_capacity(16 + 0x4000 + 0x2000);
    image.extend_from_slice(b"NES\x1A");
    image.push(1); // 1 x 16K PRG
    image.push(1); // 1 x 8K CHR
    image.extend_from_slice(&[0u8; 10]);

    let mut prg = vec![0u8; 0x4000];
    let program: &[u8] = &[
        0xA9, 0x10, // LDA #$10
        0x69, 0x05, // ADC #$05
        0x8D, 0x00, 0x02, // STA $0200
        0xE8, // INX
        0x4C, 0x07, 0x80, // JMP $8007 (keep counting)
    ];
    prg[..program.len()].copy_from_slice(program);

    // NMI, RESET and IRQ vectors all point at $8000.
    for at in [0x3FFA, 0x3FFC, 0x3FFE] {
        prg[at] = 0x00;
        prg[at + 1] = 0x80;
    }

    image.extend_from_slice(&prg);
    image.extend(std::iter::repeat_n(0u8, 0x2000)); // blank CHR
    image
}

fn main() {
    let image = match std::env::args().nth(1) {
        Some(path) => match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("cannot read {path}: {e}");
                std::process::exit(1);
            }
        },
        None => build_demo_ines(),
    };

    let cartridge = match Cartridge::from_bytes(&image) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("cartridge load failed: {e}");
            std::process::exit(1);
        }
    };

    let registry = MapperRegistry::with_builtins();
    let mut nes = match Nes::new(&cartridge, &registry) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("console setup failed: {e}");
            std::process::exit(1);
        }
    };

    // Run two frames unpaced, then report.
    let mut steps: u64 = 0;
    while nes.frame_count() < 2 {
        nes.step();
        steps += 1;
        if steps > 10_000_000 {
            eprintln!("gave up waiting for a frame");
            break;
        }
    }

    {
        let cpu = nes.cpu();
        let cpu = cpu.borrow();
        println!("frames: {}", nes.frame_count());
        println!("A: ${:02X}  X: ${:02X}  Y: ${:02X}", cpu.a, cpu.x, cpu.y);
        println!("PC: ${:04X}  SP: ${:02X}  P: {:08b}", cpu.pc, cpu.sp, cpu.status);
        println!("cycles: {}", cpu.cycles);
    }
    println!("mem[$0200]: ${:02X}", nes.bus().read(0x0200));
}
