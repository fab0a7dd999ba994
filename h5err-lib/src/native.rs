//! Raw C API calls that report failures as classified [LibraryError]s.
//!
//! Failing calls leave an error stack on the calling thread. [capture_stack] takes a copy of it,
//! which the [Session]'s [Classifier] turns into a [LibraryError].
use std::{
    cell::Cell,
    ffi::{c_char, c_uint, c_void, CStr, CString},
    path::Path,
    ptr,
};

use hdf5_sys::{
    h5::herr_t,
    h5d::{H5Dget_create_plist, H5Dget_space, H5Dget_type, H5Dopen2, H5Dread},
    h5e::{
        H5E_direction_t, H5E_error2_t, H5Eclose_stack, H5Eget_current_stack, H5Eget_msg,
        H5Eset_auto2, H5Ewalk2, H5E_DEFAULT,
    },
    h5f::{H5Fopen, H5F_ACC_RDONLY},
    h5i::{hid_t, H5Idec_ref},
    h5p::{H5Pget_filter2, H5Pget_nfilters, H5P_DEFAULT},
    h5s::{H5Sget_simple_extent_npoints, H5S_ALL},
    h5t::{H5T_class_t, H5Tget_class, H5Tget_size, H5Tis_variable_str},
    h5z::H5Zfilter_avail,
};
use serde::Serialize;
use tracing::debug;

use crate::classify::Classifier;
use crate::error::{Error, Result};
use crate::library::{Frame, LibraryError};

pub use hdf5_sys::h5z::{
    H5Z_filter_t, H5Z_FILTER_DEFLATE, H5Z_FILTER_FLETCHER32, H5Z_FILTER_NBIT,
    H5Z_FILTER_SCALEOFFSET, H5Z_FILTER_SHUFFLE, H5Z_FILTER_SZIP,
};

/// Filters predefined by the library, by id.
pub const KNOWN_FILTERS: &[(H5Z_filter_t, &str)] = &[
    (H5Z_FILTER_DEFLATE, "deflate"),
    (H5Z_FILTER_SHUFFLE, "shuffle"),
    (H5Z_FILTER_FLETCHER32, "fletcher32"),
    (H5Z_FILTER_SZIP, "szip"),
    (H5Z_FILTER_NBIT, "nbit"),
    (H5Z_FILTER_SCALEOFFSET, "scaleoffset"),
];

const FILTER_NAME_LEN: usize = 256;

macro_rules! chkid {
    ($session:expr, $id:expr, $msg:expr) => {{
        let id: hid_t = $id;
        if id < 0 {
            return Err($session.failure($msg));
        }
        Id(id)
    }};
}

macro_rules! chkerr {
    ($session:expr, $errid:expr, $msg:expr) => {
        if $errid < 0 {
            return Err($session.failure($msg));
        }
    };
}

/// Version of the linked HDF5 library.
pub fn library_version() -> String {
    let (major, minor, patch) = hdf5::library_version();
    format!("{major}.{minor}.{patch}")
}

thread_local! {
    static SILENCED: Cell<bool> = const { Cell::new(false) };
}

// Error stacks are per-thread, so automatic printing has to be turned off on each thread.
fn silence_auto_print() {
    SILENCED.with(|silenced| {
        if silenced.get() {
            return;
        }
        let errid = unsafe { H5Eset_auto2(H5E_DEFAULT, None, ptr::null_mut()) };
        if errid < 0 {
            debug!("failed to disable automatic error printing");
        }
        silenced.set(true);
    });
}

fn cstr(s: &str) -> Result<CString> {
    CString::new(s).map_err(|e| {
        Error::Binding(format!(
            "{s:?} contains a nul byte at {}",
            e.nul_position()
        ))
    })
}

fn lossy(s: *const c_char) -> String {
    if s.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned()
}

fn get_msg(msg_id: hid_t) -> String {
    let len = unsafe { H5Eget_msg(msg_id, ptr::null_mut(), ptr::null_mut(), 0) };
    if len <= 0 {
        return String::new();
    }
    let mut buf: Vec<c_char> = vec![0; len as usize + 1];
    let len = unsafe { H5Eget_msg(msg_id, ptr::null_mut(), buf.as_mut_ptr(), buf.len()) };
    if len <= 0 {
        return String::new();
    }
    lossy(buf.as_ptr())
}

struct RawFrame {
    maj_num: hid_t,
    min_num: hid_t,
    frame: Frame,
}

unsafe extern "C" fn walk_frame(
    _n: c_uint,
    err_desc: *const H5E_error2_t,
    client_data: *mut c_void,
) -> herr_t {
    if err_desc.is_null() || client_data.is_null() {
        return -1;
    }
    let frames = &mut *client_data.cast::<Vec<RawFrame>>();
    let err = &*err_desc;
    frames.push(RawFrame {
        maj_num: err.maj_num,
        min_num: err.min_num,
        frame: Frame {
            func: lossy(err.func_name),
            file: lossy(err.file_name),
            line: err.line,
            major: String::new(),
            minor: String::new(),
            desc: lossy(err.desc),
        },
    });
    0
}

/// Take the calling thread's error stack, outermost frame first.
///
/// The thread's stack is cleared as a side effect.
pub fn capture_stack() -> Vec<Frame> {
    let stack_id = unsafe { H5Eget_current_stack() };
    if stack_id < 0 {
        debug!("failed to get current error stack");
        return Vec::default();
    }

    let mut raw: Vec<RawFrame> = Vec::default();
    let errid = unsafe {
        H5Ewalk2(
            stack_id,
            H5E_direction_t::H5E_WALK_DOWNWARD,
            Some(walk_frame),
            (&mut raw as *mut Vec<RawFrame>).cast(),
        )
    };
    if errid < 0 {
        debug!("walking error stack failed after {} frames", raw.len());
    }

    let frames = raw
        .into_iter()
        .map(|r| Frame {
            major: get_msg(r.maj_num),
            minor: get_msg(r.min_num),
            ..r.frame
        })
        .collect();

    unsafe { H5Eclose_stack(stack_id) };
    frames
}

/// An owned native identifier, released on drop.
#[derive(Debug)]
pub struct Id(hid_t);

impl Id {
    pub fn id(&self) -> hid_t {
        self.0
    }
}

impl Drop for Id {
    fn drop(&mut self) {
        if unsafe { H5Idec_ref(self.0) } < 0 {
            debug!("failed to release id {}", self.0);
        }
    }
}

/// One entry of a dataset's filter pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterInfo {
    pub id: H5Z_filter_t,
    pub name: String,
    pub flags: u32,
    pub client_data: Vec<u32>,
    /// Whether the filter can be applied by the linked library.
    pub available: bool,
}

/// Performs native calls, classifying failures with its [Classifier].
#[derive(Debug, Clone)]
pub struct Session {
    classifier: Classifier,
}

impl Session {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    fn failure(&self, context: &str) -> Error {
        let err: LibraryError = self.classifier.classify_stack(capture_stack());
        debug!("{context}: {err}");
        Error::Library(err)
    }

    /// Open an existing file read-only.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Id> {
        silence_auto_print();
        let path = path.as_ref();
        let Some(name) = path.to_str() else {
            return Err(Error::Binding(format!("{path:?} is not valid UTF-8")));
        };
        let name = cstr(name)?;
        Ok(chkid!(
            self,
            unsafe { H5Fopen(name.as_ptr(), H5F_ACC_RDONLY, H5P_DEFAULT) },
            &format!("opening file {path:?}")
        ))
    }

    pub fn dataset(&self, file: &Id, name: &str) -> Result<Id> {
        silence_auto_print();
        let cname = cstr(name)?;
        Ok(chkid!(
            self,
            unsafe { H5Dopen2(file.id(), cname.as_ptr(), H5P_DEFAULT) },
            &format!("opening dataset {name}")
        ))
    }

    /// Read the whole dataset in its file representation.
    ///
    /// Variable-length data is refused since its memory belongs to the library.
    pub fn read_raw(&self, dataset: &Id) -> Result<Vec<u8>> {
        silence_auto_print();
        let dtype = chkid!(
            self,
            unsafe { H5Dget_type(dataset.id()) },
            "getting dataset type"
        );
        let class = unsafe { H5Tget_class(dtype.id()) };
        if matches!(class, H5T_class_t::H5T_NO_CLASS) {
            return Err(self.failure("getting datatype class"));
        }
        let varstr = unsafe { H5Tis_variable_str(dtype.id()) };
        chkerr!(self, varstr, "checking for variable-length string");
        if matches!(class, H5T_class_t::H5T_VLEN) || varstr > 0 {
            return Err(Error::Binding(
                "variable-length data cannot be read raw".to_string(),
            ));
        }
        let size = unsafe { H5Tget_size(dtype.id()) };
        if size == 0 {
            return Err(self.failure("getting datatype size"));
        }

        let space = chkid!(
            self,
            unsafe { H5Dget_space(dataset.id()) },
            "getting dataset dataspace"
        );
        let npoints = unsafe { H5Sget_simple_extent_npoints(space.id()) };
        chkerr!(self, npoints, "getting dataspace extent");

        let nbytes = usize::try_from(npoints)
            .ok()
            .and_then(|n| n.checked_mul(size))
            .ok_or_else(|| {
                Error::Binding(format!("{npoints} points of {size} bytes is too large"))
            })?;
        let mut buf = vec![0u8; nbytes];
        if nbytes == 0 {
            return Ok(buf);
        }

        let errid = unsafe {
            H5Dread(
                dataset.id(),
                dtype.id(),
                H5S_ALL,
                H5S_ALL,
                H5P_DEFAULT,
                buf.as_mut_ptr().cast(),
            )
        };
        chkerr!(self, errid, "reading dataset");
        debug!("read {nbytes} bytes");

        Ok(buf)
    }

    /// Whether the linked library can apply filter `id`.
    pub fn filter_available(&self, id: H5Z_filter_t) -> Result<bool> {
        silence_auto_print();
        let avail = unsafe { H5Zfilter_avail(id) };
        chkerr!(self, avail, &format!("checking filter {id}"));
        Ok(avail > 0)
    }

    /// The dataset's filter pipeline, in application order.
    pub fn pipeline(&self, dataset: &Id) -> Result<Vec<FilterInfo>> {
        silence_auto_print();
        let plist = chkid!(
            self,
            unsafe { H5Dget_create_plist(dataset.id()) },
            "getting dataset creation properties"
        );
        let nfilters = unsafe { H5Pget_nfilters(plist.id()) };
        chkerr!(self, nfilters, "getting number of filters");

        let mut filters: Vec<FilterInfo> = Vec::default();
        for idx in 0..nfilters as c_uint {
            // Sized by the first call; filters without client data need only one
            let mut cd_values: Vec<c_uint> = Vec::default();
            let mut name: Vec<c_char> = vec![0; FILTER_NAME_LEN];
            let (id, flags, cd_nelmts) = loop {
                let mut flags: c_uint = 0;
                let mut config: c_uint = 0;
                let mut cd_nelmts = cd_values.len();
                let id = unsafe {
                    H5Pget_filter2(
                        plist.id(),
                        idx,
                        &mut flags,
                        &mut cd_nelmts,
                        cd_values.as_mut_ptr(),
                        name.len(),
                        name.as_mut_ptr(),
                        &mut config,
                    )
                };
                chkerr!(self, id, &format!("getting filter {idx}"));
                if cd_nelmts <= cd_values.len() {
                    break (id, flags, cd_nelmts);
                }
                cd_values.resize(cd_nelmts, 0);
            };
            cd_values.truncate(cd_nelmts);

            filters.push(FilterInfo {
                id,
                name: lossy(name.as_ptr()),
                flags,
                client_data: cd_values,
                available: self.filter_available(id)?,
            });
        }

        Ok(filters)
    }
}
