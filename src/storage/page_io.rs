//! Page I/O operations for reading and writing pages at page-aligned offsets

use crate::common::error::Error;
use crate::storage::page::Page;
use crate::storage::page_constants::{PageId, PAGE_SIZE};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

/// Calculate the byte offset for a given page ID
pub fn page_offset(page_id: PageId) -> u64 {
    page_id * PAGE_SIZE as u64
}

/// Write a page to a file at the specified page ID
///
/// The file is extended as needed by the operating system.
///
/// # Errors
///
/// Returns an error if the file seek or write operation fails
pub fn write_page_to_file(file: &mut File, page_id: PageId, page: &Page) -> Result<(), Error> {
    file.seek(SeekFrom::Start(page_offset(page_id)))?;
    file.write_all(page.bytes())?;
    Ok(())
}

/// Read a page from a file at the specified page ID
///
/// A read past end-of-file, or a short read near it, yields a page whose
/// missing tail is zero bytes.
///
/// # Errors
///
/// Returns an error if the file seek or read operation fails
pub fn read_page_from_file(file: &mut File, page_id: PageId) -> Result<Page, Error> {
    file.seek(SeekFrom::Start(page_offset(page_id)))?;

    let mut page = Page::new();
    let mut filled = 0;
    while filled < PAGE_SIZE {
        let n = file.read(&mut page.bytes_mut()[filled..])?;
        if n == 0 {
            break; // remaining bytes stay zero
        }
        filled += n;
    }

    Ok(page)
}
