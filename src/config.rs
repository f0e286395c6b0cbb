/// Configuration for command line arguments of the driver binary.
///
/// All drivers share the same positional shape:
/// `<access|memory|sanity|next> log2_n alpha 1/q [theta]`.
pub struct Config {
    /// Which driver to run: `access`, `memory`, `sanity` or `next`
    pub mode: String,
    /// log2 of the initial bit vector length
    pub logn: u32,
    /// operations applied per bit of length
    pub alpha: f64,
    /// share of operations that are inserts/deletes, given as `1/q`
    pub update_share: f64,
    /// flatten threshold override, if any
    pub theta: Option<f32>,
}

impl Config {
    /// Create new Configuration instance based on arguments passed
    pub fn new(args: &[String]) -> Result<Self, &'static str> {
        if args.len() < 5 {
            return Err("Usage with parameters is `[access|memory|sanity|next] log2_n alpha 1/q [theta]`");
        }

        let mode = args[1].clone();
        if mode != "access" && mode != "memory" && mode != "sanity" && mode != "next" {
            return Err("mode needs to be one of `access`, `memory`, `sanity` or `next`");
        }

        let logn = args[2]
            .parse()
            .map_err(|_| "log2_n needs to be an integer")?;
        let alpha = args[3].parse().map_err(|_| "alpha needs to be a number")?;
        let update_share = args[4].parse().map_err(|_| "1/q needs to be a number")?;
        let theta = match args.get(5) {
            Some(raw) => Some(raw.parse().map_err(|_| "theta needs to be a number")?),
            None => None,
        };

        Ok(Self {
            mode,
            logn,
            alpha,
            update_share,
            theta,
        })
    }
}
