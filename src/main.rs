use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::process;

use clap::{Parser, ValueEnum};

use zipcrypt_rs::archive::ZipArchive;
use zipcrypt_rs::crc::Crc32;
use zipcrypt_rs::encoding::{decode_name, encode_name};
use zipcrypt_rs::entry::{ZipEntry, checked_size};
use zipcrypt_rs::error::{ZipError, ZipResult};
use zipcrypt_rs::extract;
use zipcrypt_rs::sink::IoSink;
use zipcrypt_rs::spool::Spool;
use zipcrypt_rs::writer::{CheckByte, ZipEncoderBuilder};

const BUF_SIZE: usize = 32768;
const STDIN_ENTRY_NAME: &str = "stdin";

#[derive(Clone, Copy, ValueEnum)]
enum CheckByteArg {
    /// Low byte of the CRC-32
    Low,
    /// High byte of the CRC-32 (PKWARE APPNOTE, expected by most unzip tools)
    High,
}

impl From<CheckByteArg> for CheckByte {
    fn from(arg: CheckByteArg) -> Self {
        match arg {
            CheckByteArg::Low => CheckByte::CrcLow,
            CheckByteArg::High => CheckByte::CrcHigh,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "zipcrypt",
    about = "Wrap a file in a single-entry ZIP, optionally ZipCrypto encrypted",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// List contents of archive
    #[arg(short = 'l', long = "list", conflicts_with_all = ["test", "pipe"])]
    list: bool,

    /// Verify entries of archive (CRC and password)
    #[arg(short = 't', long = "test", conflicts_with = "pipe")]
    test: bool,

    /// Extract entries of archive to pipe (stdout), suppress messages
    #[arg(short = 'p')]
    pipe: bool,

    /// Suppress progress messages
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Output archive, or "-" for stdout (default: <INPUT>.zip, stdout for stdin)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<String>,

    /// Entry name stored in the archive (default: input file name)
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    name: Option<String>,

    /// Set password
    #[arg(long = "pwd", value_name = "PASSWORD")]
    password: Option<String>,

    /// CRC byte stored in the encryption header
    #[arg(long = "check-byte", value_enum, default_value = "low")]
    check_byte: CheckByteArg,

    /// Code page for the entry name, e.g. "euc-kr" or "windows-1252"
    #[arg(long = "charset", value_name = "LABEL")]
    charset: Option<String>,

    /// Input file, or archive with -l/-t/-p; "-" for stdin
    input: String,
}

fn main() {
    let cli = Cli::parse();

    let quiet = cli.quiet || cli.pipe || cli.output.as_deref() == Some("-");

    if !quiet {
        eprintln!("zipcrypt-rs v{}", env!("CARGO_PKG_VERSION"));
    }

    let result = if cli.list {
        list_archive(&cli)
    } else if cli.test || cli.pipe {
        check_archive(&cli, quiet)
    } else {
        create_archive(&cli, quiet)
    };

    if let Err(e) = result {
        eprintln!("\nerr: {e}");
        process::exit(1);
    }
    if !quiet {
        eprintln!("\ndone.");
    }
}

fn create_archive(cli: &Cli, quiet: bool) -> ZipResult<()> {
    let from_stdin = cli.input == "-";

    let name = match (&cli.name, from_stdin) {
        (Some(name), _) => name.clone(),
        (None, true) => STDIN_ENTRY_NAME.to_string(),
        (None, false) => Path::new(&cli.input)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| cli.input.clone()),
    };
    let raw_name = encode_name(&name, cli.charset.as_deref())?;

    let output = match (&cli.output, from_stdin) {
        (Some(out), _) => out.clone(),
        (None, true) => "-".to_string(),
        (None, false) => format!("{}.zip", cli.input),
    };
    let out: Box<dyn Write> = if output == "-" {
        Box::new(io::stdout().lock())
    } else {
        Box::new(File::create(&output).map_err(ZipError::CantOpenDestFile)?)
    };
    let out = BufWriter::new(out);

    let password = cli.password.as_deref().map(str::as_bytes);

    if !quiet {
        let mode = if password.is_some() { "encrypted" } else { "stored" };
        eprint!("\nzipping : {} -> {output} ({mode}) ", cli.input);
    }

    let size = if from_stdin {
        let mut spool = Spool::new(password).check_byte(cli.check_byte.into());
        let mut stdin = io::stdin().lock();
        let mut buf = vec![0u8; BUF_SIZE];
        loop {
            let n = stdin.read(&mut buf)?;
            if n == 0 {
                break;
            }
            spool.push(&buf[..n]);
        }
        let size = spool.len();
        spool.finish(out, raw_name)?;
        size
    } else {
        zip_file(&cli.input, out, raw_name, password, cli.check_byte.into())?
    };

    if !quiet {
        eprint!("({size}bytes) .. ok");
    }
    Ok(())
}

/// Two passes over a regular file: CRC first, then the archive itself.
fn zip_file<W: Write>(
    path: &str,
    out: W,
    raw_name: Vec<u8>,
    password: Option<&[u8]>,
    check_byte: CheckByte,
) -> ZipResult<u64> {
    let len = std::fs::metadata(path).map_err(ZipError::CantOpenFile)?.len();
    zip_passes(
        || File::open(path).map_err(ZipError::CantOpenFile),
        len,
        out,
        raw_name,
        password,
        check_byte,
    )?;
    Ok(len)
}

/// Both passes read exactly `len` bytes from a freshly opened source, so a
/// file that changes size in between cannot desync the header from the
/// payload.
fn zip_passes<R, W, F>(
    mut open: F,
    len: u64,
    out: W,
    raw_name: Vec<u8>,
    password: Option<&[u8]>,
    check_byte: CheckByte,
) -> ZipResult<W>
where
    R: Read,
    W: Write,
    F: FnMut() -> ZipResult<R>,
{
    let size = checked_size(raw_name.len(), len, password.is_some())?;

    let mut crc = Crc32::new();
    let mut buf = vec![0u8; BUF_SIZE];
    let mut input = open()?.take(len);
    let mut seen = 0u64;
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        crc.update(&buf[..n]);
        seen += n as u64;
    }
    if seen != len {
        return Err(shrunk(len, seen));
    }

    let entry = ZipEntry::new(raw_name, size, crc.finalize());
    let mut builder = ZipEncoderBuilder::new(entry).check_byte(check_byte);
    if let Some(pwd) = password {
        builder = builder.password(pwd);
    }
    let (mut zip, res) = builder.build(IoSink::new(out))?;
    res?;

    let mut input = open()?.take(len);
    let mut seen = 0u64;
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        zip.write(&buf[..n])?;
        seen += n as u64;
    }
    if seen != len {
        return Err(shrunk(len, seen));
    }
    zip.finalize_into_inner()
}

fn shrunk(expected: u64, got: u64) -> ZipError {
    ZipError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("input shrank while zipping: expected {expected} bytes, read {got}"),
    ))
}

fn open_archive(source: &str) -> ZipResult<ZipArchive> {
    if source == "-" {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        ZipArchive::from_bytes(data)
    } else {
        ZipArchive::open(source)
    }
}

fn check_archive(cli: &Cli, quiet: bool) -> ZipResult<()> {
    let mut archive = open_archive(&cli.input)?;

    // Handle password.
    let password = match cli.password.clone() {
        Some(pwd) => Some(pwd),
        None if archive.is_encrypted => Some(prompt_password(cli.input == "-")?),
        None => None,
    };
    let password = password.as_deref().map(str::as_bytes);

    if cli.test {
        if !quiet {
            eprint!("\ntesting : {} ", cli.input);
        }
        extract::test_all(&mut archive, password)?;
        if !quiet {
            eprint!(".. ok");
        }
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let entries = archive.entries.clone();
    for entry in &entries {
        extract::extract_entry(&mut archive, entry, &mut out, password)?;
    }
    out.flush().map_err(ZipError::CantOpenDestFile)?;
    Ok(())
}

/// Stdin is already drained when the archive itself came from it.
fn prompt_password(archive_from_stdin: bool) -> ZipResult<String> {
    if archive_from_stdin {
        return Err(ZipError::PasswordNotSet);
    }
    eprint!("Enter Password : ");
    io::stderr().flush().ok();
    let mut pwd = String::new();
    io::stdin().read_line(&mut pwd)?;
    Ok(pwd.trim().to_string())
}

fn list_archive(cli: &Cli) -> ZipResult<()> {
    let archive = open_archive(&cli.input)?;

    println!("\nListing archive: {}", cli.input);
    println!();
    println!("  Uncomp Size    Comp Size Method     CRC-32 File Name");
    println!("------------ ------------ ------- -------- ------------------------------------");

    let mut total_uncompressed: u64 = 0;
    let mut total_compressed: u64 = 0;
    let mut file_count: u32 = 0;

    for entry in &archive.entries {
        let name = match cli.charset.as_deref() {
            Some(label) => decode_name(&entry.raw_name, Some(label))?,
            None => entry.file_name.clone(),
        };
        let encrypted = if entry.is_encrypted() { "*" } else { "" };

        println!(
            "{:>12} {:>12} {:<7} {:08x} {name}{encrypted}",
            entry.uncompressed_size,
            entry.compressed_size,
            entry.compression_method.to_string(),
            entry.file_crc,
        );

        file_count += 1;
        total_uncompressed += entry.uncompressed_size;
        total_compressed += entry.compressed_size;
    }

    println!("------------ ------------ ------- -------- ------------------------------------");
    let plural = if file_count <= 1 { "" } else { "s" };
    println!(
        "{total_uncompressed:>12} {total_compressed:>12}                  Total {file_count} file{plural}"
    );
    Ok(())
}
