//! Fixtures shared by unit tests

use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;

pub(crate) enum JarEntry<'a> {
    Dir(&'a str),
    File(&'a str, &'a str),
}

/// Write a zip archive containing `entries`
pub(crate) fn write_jar(path: &Path, entries: &[JarEntry<'_>]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }

    let mut jar = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
    let options = FileOptions::<()>::default();
    for entry in entries {
        match entry {
            JarEntry::Dir(name) => jar.add_directory(*name, options).unwrap(),
            JarEntry::File(name, contents) => {
                jar.start_file(*name, options).unwrap();
                jar.write_all(contents.as_bytes()).unwrap();
            }
        }
    }
    jar.finish().unwrap();
}

/// An executable JAR whose expansion contains `fixture-marker`
pub(crate) fn write_application_jar(path: &Path) {
    write_jar(
        path,
        &[
            JarEntry::Dir("META-INF/"),
            JarEntry::File(
                "META-INF/MANIFEST.MF",
                "Manifest-Version: 1.0\r\nMain-Class: com.example.Main\r\n\r\n",
            ),
            JarEntry::Dir("com/"),
            JarEntry::Dir("com/example/"),
            JarEntry::File("com/example/Main.class", "cafebabe"),
            JarEntry::File("fixture-marker", ""),
        ],
    );
}
