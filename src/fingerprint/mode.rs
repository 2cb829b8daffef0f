//! Symbolic file mode rendering
//!
//! Renders entries as `drwxr-xr-x` / `-rw-r--r--` style strings. The
//! type prefix uses one letter per set attribute (`d`, `L`, `D`, `p`,
//! `S`, `u`, `g`, `c`, `t`), or `-` when none apply.

use std::fs::Metadata;

const RWX: &[u8; 9] = b"rwxrwxrwx";

/// Render the symbolic mode string for an entry's (non-followed) metadata
#[cfg(unix)]
pub fn mode_string(metadata: &Metadata) -> String {
    use std::os::unix::fs::{FileTypeExt, PermissionsExt};

    let file_type = metadata.file_type();
    let mode = metadata.permissions().mode();

    let mut out = String::with_capacity(12);
    if file_type.is_dir() {
        out.push('d');
    }
    if file_type.is_symlink() {
        out.push('L');
    }
    if file_type.is_block_device() || file_type.is_char_device() {
        out.push('D');
    }
    if file_type.is_fifo() {
        out.push('p');
    }
    if file_type.is_socket() {
        out.push('S');
    }
    if mode & 0o4000 != 0 {
        out.push('u');
    }
    if mode & 0o2000 != 0 {
        out.push('g');
    }
    if file_type.is_char_device() {
        out.push('c');
    }
    if mode & 0o1000 != 0 {
        out.push('t');
    }
    if out.is_empty() {
        out.push('-');
    }

    push_permissions(&mut out, mode);
    out
}

/// Render the symbolic mode string for an entry's (non-followed) metadata
#[cfg(not(unix))]
pub fn mode_string(metadata: &Metadata) -> String {
    let file_type = metadata.file_type();
    let mut out = String::with_capacity(10);
    out.push(if file_type.is_dir() {
        'd'
    } else if file_type.is_symlink() {
        'L'
    } else {
        '-'
    });

    let mode = match (file_type.is_dir(), metadata.permissions().readonly()) {
        (true, false) => 0o777,
        (true, true) => 0o555,
        (false, false) => 0o666,
        (false, true) => 0o444,
    };
    push_permissions(&mut out, mode);
    out
}

fn push_permissions(out: &mut String, mode: u32) {
    for (i, c) in RWX.iter().enumerate() {
        if mode & (1 << (8 - i)) != 0 {
            out.push(char::from(*c));
        } else {
            out.push('-');
        }
    }
}
