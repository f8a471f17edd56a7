//! Fake `7z` for integration tests.
//!
//! The script answers like 7-Zip would, using sidecar files next to each image:
//! `<image>.listing` is printed for `7z l <image>`, `<image>.files/<path>` is printed
//! for `7z e <image> -so <path>`, and `<image>.exitcode` makes `l` exit with that code
//! after printing. Every path requested through `e` is appended to `<image>.reads`.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;

const FAKE_7Z: &str = r#"#!/bin/sh
if [ "$#" -eq 0 ]; then
  echo "7-Zip [64] 16.02 : Copyright (c) 1999-2016 Igor Pavlov : 2016-05-21"
  exit 0
fi
case "$1" in
  l)
    if [ -f "$2.listing" ]; then
      cat "$2.listing"
      if [ -f "$2.exitcode" ]; then exit "$(cat "$2.exitcode")"; fi
      exit 0
    fi
    exit 2
    ;;
  e)
    echo "$4" >> "$2.reads"
    if [ "$4" = "slow" ]; then exec sleep 5; fi
    if [ -f "$2.files/$4" ]; then
      cat "$2.files/$4"
      exit 0
    fi
    echo "ERROR: $4 : cannot find the file" >&2
    exit 2
    ;;
esac
exit 7
"#;

/// Writes the fake tool into `dir` and returns its path.
pub fn fake_tool(dir: &Path) -> PathBuf {
    let path = dir.join("fake-7z");
    fs::write(&path, FAKE_7Z).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
    // A process forked by a parallel test may briefly hold our write handle (ETXTBSY).
    for _ in 0..50 {
        match Command::new(&path).output() {
            Err(e) if e.raw_os_error() == Some(26) => thread::sleep(Duration::from_millis(20)),
            _ => break,
        }
    }
    path
}

/// Paths the tool was asked to extract from `image`, in request order.
pub fn extract_requests(image: &Path) -> Vec<String> {
    let mut log = image.as_os_str().to_owned();
    log.push(".reads");
    fs::read_to_string(log)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Creates an (empty) image file plus its listing and file bodies.
pub fn add_image(dir: &Path, name: &str, listing: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let image = dir.join(name);
    fs::write(&image, b"").unwrap();
    fs::write(dir.join(format!("{name}.listing")), listing).unwrap();
    for (inner, body) in files {
        let target = dir.join(format!("{name}.files")).join(inner);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, body).unwrap();
    }
    image
}

pub const REPO_LISTING: &str = "\
7-Zip [64] 16.02 : Copyright (c) 1999-2016 Igor Pavlov : 2016-05-21

Listing archive: repo.iso

--
Path = repo.iso
Type = Iso

   Date      Time    Attr         Size   Compressed  Name
------------------- ----- ------------ ------------  ------------------------
2018-06-20 20:32:10 D....                            dists
2018-06-20 20:32:10 D....                            dists\\stable
2018-06-20 20:32:10 D....                            dists\\stable\\main
2018-06-20 20:32:10 D....                            dists\\stable\\main\\binary-amd64
2018-06-20 20:32:10 .....           37           37  dists\\stable\\Release
2018-06-20 20:32:10 .....           12           12  dists\\stable\\main\\binary-amd64\\Packages
2018-06-20 18:50:00 .....            5            5  pool\\main\\h\\hello_1.0_amd64.deb
2018-06-20 20:52:22 D....                            boot\\grub\\i386-efi
------------------- ----- ------------ ------------  ------------------------
2018-06-20 20:52:22                 54           54  3 files, 7 folders
";

pub const RELEASE: &[u8] = b"Suite: stable\nComponents: main contrib\n";

pub fn repo_image(dir: &Path) -> PathBuf {
    add_image(
        dir,
        "repo.iso",
        REPO_LISTING,
        &[
            ("dists/stable/Release", RELEASE),
            ("dists/stable/main/binary-amd64/Packages", b"Package: x\n\n"),
            ("pool/main/h/hello_1.0_amd64.deb", b"hello"),
        ],
    )
}

pub const PLAIN_LISTING: &str = "\
2020-01-01 00:00:00 D....                            boot
2020-01-01 00:00:00 .....            4            4  boot\\vmlinuz
";
