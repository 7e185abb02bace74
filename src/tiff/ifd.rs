//! Contains the Image File Directory (IFD) data structure
//! and the iterator that walks the chain of IFDs through a file.
//! `.siff` files are always `BigTiff`, but classic `Tiff` IFDs
//! are parsed too and widened into `BigTiffIFD`s so everything
//! downstream only ever sees one type.

use std::collections::HashSet;
use std::fmt::Debug;
use std::iter::Iterator;
use std::marker::PhantomData;
use binrw::{
    io::{Read, Seek, SeekFrom},
    BinRead,
    meta::ReadEndian,
};

use crate::{
    tiff::tags::{TiffTag, TiffTagID, BigTag, Tag},
    data::image::Dimensions,
};

pub trait SeekRead : Seek + Read {}
impl<T : Seek + Read> SeekRead for T {}

/// Generic IFD trait for the `Tiff`, `BigTiff`, and `siff` formats
pub trait IFD : BinRead + ReadEndian + Debug {
    type TagType : Tag;

    /// Returns the location of the next IFD in the file,
    /// or `None` if this is the last one.
    fn next_ifd(&self) -> Option<u64>;

    /// Returns an object implementing the `Tag` trait
    /// whose `TiffTagID` matches that provided
    ///
    /// ## Arguments
    ///
    /// * `tag_id` - The `TiffTagID` of the tag to retrieve
    ///
    /// ## Returns
    ///
    /// * `Option<&Self::TagType>` - A reference to the tag if it exists
    /// in the IFD
    fn get_tag(&self, tag_id : TiffTagID) -> Option<&Self::TagType>;

    /// Returns the width of the frame this IFD corresponds to
    fn width(&self) -> Option<u64> {
        self.get_tag(TiffTagID::ImageWidth).map(|tag| tag.value().into())
    }

    /// Returns the height of the frame this IFD corresponds to
    fn height(&self) -> Option<u64> {
        self.get_tag(TiffTagID::ImageLength).map(|tag| tag.value().into())
    }

    /// If `height` and `width` are both valid, returns
    /// a `Dimensions` object containing the dimensions
    /// of the frame this IFD corresponds to.
    fn dimensions(&self) -> Option<Dimensions> {
        match (self.width(), self.height()) {
            (Some(w), Some(h)) => Some(Dimensions::new(w, h)),
            _ => None,
        }
    }
}

/// A classic (32-bit offset) `Tiff` IFD.
#[derive(BinRead, Debug)]
#[br(little)]
pub struct TiffIFD {
    num_tags : u16,

    #[br(count = num_tags)]
    tags : Vec<TiffTag>,

    next_ifd : u32,
}

impl IFD for TiffIFD {
    type TagType = TiffTag;

    fn next_ifd(&self) -> Option<u64> {
        match self.next_ifd {
            0 => None,
            next => Some(next as u64),
        }
    }

    fn get_tag(&self, tag_id : TiffTagID) -> Option<&TiffTag> {
        self.tags.iter().find(|tag| tag.tag == tag_id)
    }
}

/// Contains the IFD data, which is the
/// primary data structure for reading
/// `.siff` files.
#[derive(BinRead, Debug)]
#[br(little)]
pub struct BigTiffIFD {
    num_tags : u64,

    #[br(count = num_tags)]
    tags : Vec<BigTag>,

    next_ifd : u64,
}

impl IFD for BigTiffIFD {
    type TagType = BigTag;

    fn next_ifd(&self) -> Option<u64> {
        match self.next_ifd {
            0 => None,
            next => Some(next),
        }
    }

    fn get_tag(&self, tag_id : TiffTagID) -> Option<&BigTag> {
        self.tags.iter().find(|tag| tag.tag == tag_id)
    }
}

impl From<TiffIFD> for BigTiffIFD {
    fn from(ifd : TiffIFD) -> Self {
        BigTiffIFD {
            num_tags : ifd.num_tags as u64,
            tags : ifd.tags.into_iter().map(BigTag::from).collect(),
            next_ifd : ifd.next_ifd as u64,
        }
    }
}

/// Walks the chain of IFDs in a file, starting from the
/// pointer it is constructed with. Each item is the parsed
/// IFD or the error that stopped the walk. After an error
/// the iterator is exhausted.
///
/// A pointer back to an IFD already visited, or past the
/// end of the file, is an error rather than a walk that
/// never ends.
pub struct IFDIterator<'reader, S, T> where S : SeekRead, T : IFD {
    reader : &'reader mut S,
    to_next : u64,
    visited : HashSet<u64>,
    file_len : Option<u64>,
    _ifd : PhantomData<T>,
}

impl <'a, S, IFDT> IFDIterator<'a, S, IFDT>
    where S : SeekRead, IFDT : IFD {

    /// Creates a new `IFDIterator` object from an object that
    /// can read and seek and the location of the first IFD (so that
    /// it can parse it and find the subsequent IFDs).
    ///
    /// ## Arguments
    ///
    /// * `reader` - A reader that can read and seek
    /// * `first_ifd` - The location of the first IFD in the file
    pub fn new(reader : &'a mut S, first_ifd : u64) -> Self {
        IFDIterator{
            reader,
            to_next : first_ifd,
            visited : HashSet::new(),
            file_len : None,
            _ifd : PhantomData,
        }
    }
}

impl<'a, S, IFDT> IFDIterator<'a, S, IFDT>
    where S : SeekRead, IFDT : IFD {

    /// Errors if `pointer` was already walked or
    /// points past the end of the file.
    fn check_pointer(&mut self, pointer : u64) -> binrw::BinResult<()> {
        let file_len = match self.file_len {
            Some(len) => len,
            None => {
                let len = self.reader.seek(SeekFrom::End(0))?;
                self.file_len = Some(len);
                len
            }
        };

        if pointer >= file_len {
            return Err(binrw::Error::AssertFail {
                pos : pointer,
                message : format!("IFD pointer {} is past the end of the file ({} bytes)", pointer, file_len),
            });
        }
        if !self.visited.insert(pointer) {
            return Err(binrw::Error::AssertFail {
                pos : pointer,
                message : format!("IFD chain loops back to {}", pointer),
            });
        }
        Ok(())
    }
}

impl<'a, S, IFDT> Iterator for IFDIterator<'a, S, IFDT>
    where S : SeekRead, IFDT : IFD,
    for<'args> IFDT::Args<'args> : Default {
    type Item = binrw::BinResult<IFDT>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.to_next == 0 {
            return None
        }

        let parsed = self.check_pointer(self.to_next)
            .and_then(|_| self.reader.seek(SeekFrom::Start(self.to_next)).map_err(binrw::Error::Io))
            .and_then(|_| IFDT::read(&mut *self.reader));

        self.to_next = match &parsed {
            Ok(ifd) => ifd.next_ifd().unwrap_or(0),
            Err(_) => 0,
        };
        Some(parsed)
    }
}
