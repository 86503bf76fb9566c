use snafu::Snafu;

/// The public Error type for this library.
#[derive(Debug, Snafu)]
pub struct Error(LibError);

/// The public Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// The internal Result type for this library.
pub(crate) type LibResult<T> = std::result::Result<T, LibError>;

/// The internal Error type for this library.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum LibError {
    #[snafu(display("{}: could not connect to the JACK server as '{}': {}", site, name, source))]
    HostConnect {
        site: String,
        name: String,
        source: jack::Error,
    },

    #[snafu(display("{}: cannot register port '{}': {}", site, port, source))]
    PortRegister {
        site: String,
        port: String,
        source: jack::Error,
    },

    #[snafu(display("{}: cannot activate the JACK client: {}", site, source))]
    Activate { site: String, source: jack::Error },

    #[snafu(display("{}: '{}' is not a usable framerate", site, value))]
    ParseRate { site: String, value: String },
}

macro_rules! site {
    () => {
        format!("{}:{}", file!(), line!())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_test() {
        let line = line!() + 1;
        let site = site!();
        assert!(site.contains("error.rs"));
        assert!(site.contains(format!("{}", line).as_str()));
    }

    #[test]
    fn parse_rate_display_test() {
        let e: Error = Error::from(
            ParseRateSnafu {
                site: site!(),
                value: "0/0",
            }
            .build(),
        );
        let message = format!("{}", e);
        assert!(message.contains("0/0"));
        assert!(message.contains("framerate"));
    }
}
