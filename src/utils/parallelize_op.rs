/// `parallelize_op!` macro for repeating an operation across
/// chunks of requested frames.
///
/// - `parallelize_op!(array, chunk_size, frames, filename, op)`
///
///     For loading an array along its slow axis in parallel.
///     Divides the array into chunks and parallelizes the operation
///     `op` on each chunk. The operation `op` should take a slice of
///     frames, a mutable reference to a chunk of the array along its 0th axis,
///     and a reader, with the signature
///     `op(frames : &[u64], chunk : &mut ArrayViewMut, reader : &mut BufReader<File>)`.
///     Opens local copies of the file for reading.
///
/// - `parallelize_op!(reduce chunk_size, frames, filename, identity, op)`
///
///     For operations that produce one value per chunk of frames
///     which are then summed together (e.g. histograms). `identity`
///     builds the empty accumulator, `op(frames, accumulator, reader)`
///     fills it.
///
/// Both forms evaluate to a `Result<_, FramesError>` holding the
/// first error any chunk hit.
macro_rules! parallelize_op {

    (   $array : ident,
        $chunk_size : expr,
        $frames : ident,
        $filename : expr,
        $op : expr
    ) => {{
        // Create an array of chunks to parallelize
        let array_chunks : Vec<_> = $array.axis_chunks_iter_mut(Axis(0), $chunk_size).collect();

        array_chunks.into_par_iter().enumerate().try_for_each(
            |(chunk_idx, mut chunk)| -> Result<(), FramesError> {
            // Get the frame numbers for the frames in the chunk
            let start = chunk_idx * $chunk_size;
            let end = ((chunk_idx + 1) * $chunk_size).min($frames.len());

            let local_frames = &$frames[start..end];
            let mut local_f = BufReader::new(File::open(&$filename)?);

            $op(local_frames, &mut chunk, &mut local_f)
            }
        )
    }};

    (   reduce $chunk_size : expr,
        $frames : ident,
        $filename : expr,
        $identity : expr,
        $op : expr
    ) => {{
        $frames.par_chunks($chunk_size).map(
            |local_frames| -> Result<_, FramesError> {
                let mut accumulator = $identity();
                let mut local_f = BufReader::new(File::open(&$filename)?);
                $op(local_frames, &mut accumulator, &mut local_f)?;
                Ok(accumulator)
            }
        ).try_reduce($identity, |a, b| Ok(a + b))
    }};
}

pub(crate) use parallelize_op;
