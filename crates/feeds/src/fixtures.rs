//! Upstream payloads captured in the shapes the live services return.

use crate::FetchError;

pub const DMC_BASE: &str = "https://dmc.test";
pub const AGROMET_BASE: &str = "https://agromet.test";
pub const FIRMS_BASE: &str = "https://firms.test";

pub const DMC_RECENT: &str = r#"{
  "datosEstaciones": [
    {
      "estacion": {
        "codigoNacional": "330020",
        "nombreEstacion": "Quinta Normal, Santiago",
        "altura": "527",
        "latitud": "-33.4447",
        "longitud": "-70.6828"
      },
      "datos": [
        {
          "momento": "2024-01-05 15:00:00",
          "temperatura": "28.4",
          "humedadRelativa": "31",
          "aguaCaida24Horas": "0",
          "direccionDelViento": "220",
          "fuerzaDelViento": "10 kt"
        }
      ]
    },
    {
      "estacion": {
        "codigoNacional": "360019",
        "nombreEstacion": "ConcepciÃ³n",
        "altura": null,
        "latitud": "-36,78",
        "longitud": "-73.05"
      },
      "datos": null
    },
    {
      "estacion": {
        "codigoNacional": "270001",
        "nombreEstacion": "Isla de Pascua",
        "latitud": -27.15,
        "longitud": -109.42
      },
      "datos": {
        "momento": "2024-01-05T15:00:00Z",
        "temperatura": 24.1,
        "humedadRelativa": "n/d"
      }
    }
  ]
}"#;

pub const AGROMET_PAGE: &str = r#"<!DOCTYPE html>
<html lang="es">
<head><title>Red Agrometeorológica</title></head>
<body>
  <div id="map" data-ts-map-tmp="tmp-20240105" data-zoom="5"></div>
</body>
</html>"#;

pub const AGROMET_TA: &str = r#"[
  {
    "id": 101,
    "nombre": "Quinta Normal, Santiago",
    "latitud": -33.4449,
    "longitud": -70.6831,
    "elevacion": 520,
    "institucion_sigla": "INIA",
    "STACK-HOUR": {
      "2024-01-05 11:00:00": {"TA-AVG": "27,1"},
      "2024-01-05 12:00:00": {"TA-AVG": "28,0"}
    }
  },
  {
    "id": 202,
    "nombre": "Chillán",
    "latitud": -36.6,
    "longitud": -72.1,
    "elevacion": 140,
    "institucion_sigla": "INIA",
    "STACK-HOUR": {
      "2024-01-05 11:00:00": {"TA-AVG": 25.5},
      "2024-01-05 12:00:00": {"TA-AVG": null}
    }
  },
  {
    "id": 303,
    "nombre": "Santiago Centro",
    "latitud": -33.44,
    "longitud": -70.65,
    "elevacion": 570,
    "institucion_sigla": "MMA-DMC",
    "STACK-HOUR": {
      "2024-01-05 12:00:00": {"TA-AVG": 29}
    }
  },
  {
    "id": 404,
    "nombre": "Talca",
    "latitud": -35.43,
    "longitud": -71.66,
    "elevacion": 100,
    "institucion_sigla": "INIA",
    "STACK-HOUR": []
  },
  {
    "id": 505,
    "nombre": "Sin ubicación",
    "latitud": null,
    "longitud": -71.0,
    "elevacion": 300,
    "institucion_sigla": "INIA",
    "STACK-HOUR": {
      "2024-01-05 12:00:00": {"TA-AVG": 20}
    }
  }
]"#;

pub const AGROMET_PP: &str = r#"[
  {
    "id": 202,
    "nombre": "Chillán",
    "latitud": -36.6,
    "longitud": -72.1,
    "elevacion": 140,
    "institucion_sigla": "INIA",
    "STACK-HOUR": {
      "2024-01-05 12:00:00": {"PP-SUM": "0,2"}
    }
  }
]"#;

pub const AGROMET_VV: &str = r#"[
  {
    "id": 202,
    "nombre": "Chillán",
    "latitud": -36.6,
    "longitud": -72.1,
    "elevacion": 140,
    "institucion_sigla": "INIA",
    "STACK-HOUR": {
      "2024-01-05 12:00:00": {"VV-AVG": 7.2, "DV-AVG": 180}
    }
  }
]"#;

pub const FIRMS_CSV: &str = "\
latitude,longitude,brightness,scan,track,acq_date,acq_time,satellite,instrument,confidence,version,bright_t31,frp,daynight
-36.5021,-72.0433,331.4,1.1,1.0,2024-01-05,930,Terra,MODIS,78,6.1NRT,297.2,25.3,D
-37.1200,-72.4000,318.0,1.0,1.0,2024-01-05,1745,Aqua,MODIS,n,6.1NRT,290.1,11.0,D
-38.0000,-72.9000,305.2,1.0,1.0,2024-13-45,0100,Aqua,MODIS,40,6.1NRT,285.0,8.2,N
";

/// Answers Agromet URLs the way the live site did during one cycle, with
/// the humidity document failing.
pub fn agromet_route(url: &str) -> Result<String, FetchError> {
    let asset = format!("{}/json/tmp-20240105", AGROMET_BASE);
    let body = match url.strip_prefix(asset.as_str()) {
        _ if url == AGROMET_BASE => AGROMET_PAGE,
        Some("/items-ta.json") => AGROMET_TA,
        Some("/items-pp.json") => AGROMET_PP,
        Some("/items-vv.json") => AGROMET_VV,
        Some("/items-hr.json") => {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            })
        }
        _ => {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    };
    Ok(body.to_string())
}
